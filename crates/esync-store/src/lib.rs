//! Tree store backends for etcd-sync.
//!
//! A backend reads its location into a [`Tree`](esync_types::Tree) snapshot
//! and replays an [`EditScript`](esync_types::EditScript) against it, one
//! operation at a time, in script order.
//!
//! # Backends
//!
//! All backends implement the [`TreeStore`] trait:
//!
//! - [`MemoryTreeStore`] -- `RwLock`-guarded tree for tests and embedding
//! - [`FsTreeStore`] -- a directory on the local filesystem
//! - [`EtcdTreeStore`] -- a key prefix in etcd, over the v2 keys HTTP API
//!
//! # Design Rules
//!
//! 1. A location that does not exist reads as `None`, not as an empty tree.
//! 2. Operations are applied strictly in order; the first failure stops the
//!    replay and is returned with the index of the failing operation.
//! 3. There is no rollback. Operations applied before a failure stay applied.

pub mod error;
pub mod etcd;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use etcd::{EtcdOptions, EtcdTreeStore};
pub use fs::FsTreeStore;
pub use memory::MemoryTreeStore;
pub use traits::TreeStore;
