//! Repository session for sit.
//!
//! [`Repository`] owns one open `.sit/` directory: the object store, the
//! commit graph, the refs, the loaded index and the configuration. Every
//! operation that changes the index saves it before returning.
//!
//! ```no_run
//! use sit_engine::Repository;
//!
//! let mut repo = Repository::discover(std::path::Path::new("."))?;
//! repo.add(&["src"])?;
//! let commit = repo.commit(Some("import sources"), false)?;
//! println!("{}", commit.id.short_hex());
//! # Ok::<(), sit_engine::EngineError>(())
//! ```

pub mod commit;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod repository;
pub mod status;
pub mod worktree;

pub use commit::clean_message;
pub use config::{Config, EngineSettings};
pub use error::{EngineError, EngineResult, Severity};
pub use reconcile::{AddReport, CheckoutReport, CheckoutTarget, ResetAction, ResetKind};
pub use repository::{Repository, SnapshotSource, SIT_DIR};
pub use status::Status;

// Re-export the types callers need to inspect results.
pub use sit_dag::Commit;
pub use sit_diff::{DiffEntry, DiffStatus, SnapshotDiff};
pub use sit_index::{MatchMode, Snapshot};
pub use sit_refs::Head;
pub use sit_types::{CommitId, ObjectId};
