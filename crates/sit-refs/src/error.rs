use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefError {
    #[error("no branch named `{name}`")]
    NotFound { name: String },

    #[error("a branch named `{name}` already exists")]
    AlreadyExists { name: String },

    #[error("`{name}` is not a valid branch name: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// HEAD or a branch file holds something other than a ref or an id.
    #[error("corrupt ref file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RefError>;
