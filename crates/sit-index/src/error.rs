//! Error types for the index crate.

/// Errors that can occur during index and tree codec operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A path that cannot be stored in the index.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// A path is staged both as a file and as a directory.
    #[error("path is both a file and a directory: {0}")]
    PathConflict(String),

    /// `save` was called on an index with no backing file.
    #[error("index has no backing file")]
    NoBackingFile,

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] sit_store::StoreError),

    /// Reading or writing the index file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
