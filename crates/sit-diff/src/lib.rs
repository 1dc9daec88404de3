//! Diff engine for sit.
//!
//! Compares two flat snapshots by blob id and classifies every path. No
//! content is read; line-level rendering is left to the caller.
//!
//! # Key Types
//!
//! - [`SnapshotDiff`] / [`DiffEntry`] -- Per-path comparison result
//! - [`DiffStatus`] -- Unchanged, added, removed or modified

pub mod error;
pub mod snapshot_diff;

pub use error::{DiffError, DiffResult};
pub use snapshot_diff::{diff_filtered, diff_snapshots, diff_trees, DiffEntry, DiffStatus, SnapshotDiff};
