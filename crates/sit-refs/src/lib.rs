//! Reference management for sit.
//!
//! Branches are named, mutable pointers to commits. HEAD either names the
//! current branch (symbolic) or holds a commit id directly (detached).
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`types`]: [`Head`] and its on-disk form
//! - [`traits`]: The [`RefStore`] trait defining the storage interface
//! - [`names`]: Branch name validation
//! - [`fs`]: [`FsRefStore`], the `.sit/` file layout

pub mod error;
pub mod fs;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use names::validate_branch_name;
pub use traits::RefStore;
pub use types::Head;
