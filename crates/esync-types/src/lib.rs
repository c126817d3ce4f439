//! Foundation types for etcd-sync.
//!
//! This crate provides the tree model both sides of a sync are read into,
//! and the edit script the diff engine produces. Every other etcd-sync crate
//! depends on `esync-types`.
//!
//! # Key Types
//!
//! - [`Tree`] / [`Node`] — Hierarchical key/value snapshot (subtrees and leaf values)
//! - [`TreePath`] — `/`-separated path from the tree root (`""`)
//! - [`Operation`] — A single edit (`MKDIR`, `RMDIR`, `SET`, `DEL`)
//! - [`EditScript`] — Ordered, replayable sequence of operations

pub mod error;
pub mod operation;
pub mod path;
pub mod replay;
pub mod tree;

pub use error::{TypeError, TypeResult};
pub use operation::{EditScript, Operation, OperationKind, OperationRecord, ScriptStats};
pub use path::TreePath;
pub use replay::replay_operation;
pub use tree::{Node, NodeKind, Tree};
