use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid segment name: {0:?}")]
    InvalidName(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid value for {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// An operation could not be replayed against a tree.
    #[error("cannot replay {kind} {path}: {reason}")]
    Replay {
        kind: String,
        path: String,
        reason: String,
    },
}

/// Convenience alias for results in this crate.
pub type TypeResult<T> = Result<T, TypeError>;
