//! Staging index and tree codec for sit.
//!
//! The index is the mutable path-to-blob map that becomes the next commit's
//! tree. The codec turns that flat map into nested tree objects and walks a
//! stored tree back into a flat map.
//!
//! # Key Types
//!
//! - [`Index`] -- The staging area (BTreeMap-backed), with load/save
//! - [`MatchMode`] -- How directory-scoped operations match paths
//! - [`Forest`] / [`ForestNode`] -- Transient nested form used while writing trees
//! - [`Snapshot`] -- A flat, ordered path-to-blob map

pub mod codec;
pub mod error;
pub mod index;
pub mod matching;

use std::collections::BTreeMap;

use sit_types::ObjectId;

pub use codec::{build_forest, flush, materialize, write_index, write_snapshot, Forest, ForestNode};
pub use error::{IndexError, IndexResult};
pub use index::{validate_path, Index};
pub use matching::MatchMode;

/// A flat, ordered map from forward-slash relative path to blob id.
pub type Snapshot = BTreeMap<String, ObjectId>;
