//! Error types for the commit graph.

use sit_types::CommitId;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No record exists for this commit.
    #[error("commit not found: {0}")]
    NotFound(CommitId),

    /// A short id matched no commit.
    #[error("unknown commit: {0}")]
    UnknownPrefix(String),

    /// A short id matched more than one commit.
    #[error("ambiguous commit prefix {prefix:?} matches {count} commits")]
    AmbiguousPrefix { prefix: String, count: usize },

    /// Walking `~N` ran past the root of history.
    #[error("{start} has fewer than {steps} ancestors")]
    HistoryTooShort { start: CommitId, steps: usize },

    /// A record failed to parse.
    #[error("corrupt commit record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// A field cannot be represented in the record grammar.
    #[error("invalid commit field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Storage I/O error.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
