//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Materializing one side of the diff failed.
    #[error("cannot read snapshot: {0}")]
    Snapshot(#[from] sit_index::IndexError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
