use std::path::PathBuf;

use sit_dag::GraphError;
use sit_diff::DiffError;
use sit_index::IndexError;
use sit_refs::RefError;
use sit_store::StoreError;

/// How the boundary should treat an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Bad input: report it and abort the current operation.
    User,
    /// Broken environment: no repository, failing filesystem, corrupt data.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("not a sit repository (or any of the parent directories): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("{} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("path is outside the work tree: {}", .0.display())]
    OutsideWorkTree(PathBuf),

    #[error("no such file and nothing tracked under it: {0}")]
    NoSuchPath(String),

    #[error("{0} is not tracked")]
    Untracked(String),

    #[error("a path is required")]
    MissingPath,

    #[error("unknown revision: {0}")]
    UnknownRevision(String),

    #[error("commit message is empty")]
    EmptyMessage,

    #[error("`{key}` not found in configuration\n`sit config {key} <value>` may help")]
    MissingConfig { key: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HEAD is not on a branch; cannot commit")]
    DetachedHead,

    #[error("cannot amend the root commit")]
    AmendRoot,

    #[error("you have uncommitted changes; commit or reset before checkout")]
    DirtyWorkTree,

    #[error("untracked {0} is in the way of checkout")]
    CheckoutConflict(String),

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DiffError> for EngineError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::Snapshot(e) => Self::Index(e),
        }
    }
}

impl EngineError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::NotARepository(_)
            | Self::NotADirectory(_)
            | Self::InvalidConfig(_)
            | Self::Store(_)
            | Self::Io(_) => Severity::Fatal,
            Self::Graph(e) => match e {
                GraphError::Corrupt { .. } | GraphError::Io(_) => Severity::Fatal,
                _ => Severity::User,
            },
            Self::Ref(e) => match e {
                RefError::Corrupt { .. } | RefError::Io(_) => Severity::Fatal,
                _ => Severity::User,
            },
            Self::Index(e) => match e {
                IndexError::InvalidPath(_) | IndexError::PathConflict(_) => Severity::User,
                _ => Severity::Fatal,
            },
            _ => Severity::User,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
