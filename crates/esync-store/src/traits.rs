use async_trait::async_trait;
use esync_types::{EditScript, Operation, Tree};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A location holding a hierarchical key/value tree.
///
/// Implementations must satisfy these invariants:
/// - `read_tree` returns a complete point-in-time snapshot, or `None` when the
///   location does not exist at all.
/// - `apply_operation` performs exactly one non-recursive edit and does not
///   return until it has completed.
/// - Nothing is retried and nothing is rolled back.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Read the whole tree at this store's location.
    async fn read_tree(&self) -> StoreResult<Option<Tree>>;

    /// Apply a single operation. Paths are relative to the store's location.
    async fn apply_operation(&self, op: &Operation) -> StoreResult<()>;

    /// Prefix shown in front of operation paths when describing a script
    /// against this store.
    fn location(&self) -> String;

    /// Apply every operation of `script` in order and return how many were
    /// applied.
    ///
    /// Stops at the first failure, which is wrapped in
    /// [`StoreError::Operation`]. Operations before it stay applied.
    async fn apply(&self, script: &EditScript) -> StoreResult<usize> {
        for (index, op) in script.iter().enumerate() {
            debug!(index, kind = %op.kind(), path = %op.path(), "applying operation");
            self.apply_operation(op)
                .await
                .map_err(|source| StoreError::Operation {
                    index,
                    kind: op.kind(),
                    path: op.path().clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(script.len())
    }
}
