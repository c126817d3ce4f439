use std::path::PathBuf;

use esync_types::{OperationKind, TreePath, TypeError};

/// Errors from tree store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the local filesystem.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A filesystem entry name is not valid UTF-8.
    #[error("file name is not valid UTF-8: {}", .0.display())]
    NonUtf8Name(PathBuf),

    /// The location exists but is not a directory.
    #[error("{0} is not a directory")]
    NotADirectory(String),

    /// Transport failure talking to etcd.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// etcd rejected a request.
    #[error("etcd error {code} on {key}: {message}")]
    Etcd {
        code: u32,
        message: String,
        key: String,
    },

    /// etcd answered with something that is not a keys API response.
    #[error("unexpected etcd response: {0}")]
    Protocol(String),

    #[error("invalid etcd URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// etcd v2 values are strings; a value that is not UTF-8 cannot be stored.
    #[error("value at {0} is not valid UTF-8")]
    NonUtf8Value(TreePath),

    /// Tree construction or in-memory replay failed.
    #[error(transparent)]
    Types(#[from] TypeError),

    /// A blocking filesystem task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// An operation of an edit script failed; everything before `index` was
    /// applied.
    #[error("operation #{index} ({kind} {path}) failed: {source}")]
    Operation {
        index: usize,
        kind: OperationKind,
        path: TreePath,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
