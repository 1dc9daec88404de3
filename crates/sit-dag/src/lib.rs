//! Commit graph for sit.
//!
//! Commit records live outside the content-addressed object store because
//! they change after creation: a parent's successor list grows when a child
//! is committed, and amend rewrites a commit's payload under the same id.
//! History traversal is first-parent only.

pub mod commit;
pub mod error;
pub mod graph;
pub mod store;

pub use commit::Commit;
pub use error::{GraphError, GraphResult};
pub use graph::CommitGraph;
pub use store::{CommitStore, FsCommitStore, InMemoryCommitStore};
