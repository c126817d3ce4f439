//! Diff engine for etcd-sync.
//!
//! Compares two tree snapshots and produces the ordered [`EditScript`] that
//! turns the first into the second, plus a human-readable description of a
//! script for previews.
//!
//! # Key Items
//!
//! - [`diff`] -- Compute the edit script between a base and a target tree
//! - [`describe`] / [`DescribeOptions`] -- Render a script one line per operation
//! - [`DiffError`] -- Type conflicts between the two sides
//!
//! [`EditScript`]: esync_types::EditScript

pub mod describe;
pub mod engine;
pub mod error;

pub use describe::{describe, describe_default, describe_operation, DescribeOptions};
pub use engine::diff;
pub use error::{DiffError, DiffResult};
