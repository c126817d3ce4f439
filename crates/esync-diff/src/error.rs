//! Error types for the diff crate.

use esync_types::{NodeKind, TreePath};

/// Errors that can occur during diff operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The same path is a directory on one side and a value on the other.
    #[error("mismatch between type of {path}: {base} in base, {target} in target")]
    TypeConflict {
        path: TreePath,
        base: NodeKind,
        target: NodeKind,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
