//! Snapshot-level diff: classify every path present on either side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sit_index::{materialize, MatchMode, Snapshot};
use sit_store::ObjectStore;
use sit_types::ObjectId;

use crate::error::DiffResult;

/// How a path differs between base and target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Unchanged,
    Added,
    Removed,
    Modified,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }

    /// One-letter tag used in short listings.
    pub fn letter(&self) -> char {
        match self {
            Self::Unchanged => ' ',
            Self::Added => 'A',
            Self::Removed => 'D',
            Self::Modified => 'M',
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One path's comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub status: DiffStatus,
    /// Blob id in the base snapshot.
    pub old: Option<ObjectId>,
    /// Blob id in the target snapshot.
    pub new: Option<ObjectId>,
}

impl DiffEntry {
    fn classify(old: Option<ObjectId>, new: Option<ObjectId>) -> Self {
        let status = match (old, new) {
            (Some(a), Some(b)) if a == b => DiffStatus::Unchanged,
            (Some(_), Some(_)) => DiffStatus::Modified,
            (None, Some(_)) => DiffStatus::Added,
            (Some(_), None) => DiffStatus::Removed,
            (None, None) => DiffStatus::Unchanged,
        };
        Self { status, old, new }
    }
}

/// Per-path result of comparing two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotDiff {
    pub entries: BTreeMap<String, DiffEntry>,
}

impl SnapshotDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries whose status is not `Unchanged`, in path order.
    pub fn changes(&self) -> impl Iterator<Item = (&String, &DiffEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.status != DiffStatus::Unchanged)
    }

    /// Drop unchanged entries.
    pub fn only_changes(mut self) -> Self {
        self.entries.retain(|_, e| e.status != DiffStatus::Unchanged);
        self
    }

    /// `true` if no path differs.
    pub fn is_clean(&self) -> bool {
        self.changes().next().is_none()
    }

    pub fn status_of(&self, path: &str) -> Option<DiffStatus> {
        self.entries.get(path).map(|e| e.status)
    }

    pub fn count(&self, status: DiffStatus) -> usize {
        self.entries.values().filter(|e| e.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classify every path in `base` or `target`, including unchanged ones.
pub fn diff_snapshots(base: &Snapshot, target: &Snapshot) -> SnapshotDiff {
    let mut entries = BTreeMap::new();
    for (path, old) in base {
        entries.insert(
            path.clone(),
            DiffEntry::classify(Some(*old), target.get(path).copied()),
        );
    }
    for (path, new) in target {
        if !base.contains_key(path) {
            entries.insert(path.clone(), DiffEntry::classify(None, Some(*new)));
        }
    }
    SnapshotDiff { entries }
}

/// Compare only paths selected by one of `filters` on either side, and keep
/// only entries that differ. An empty filter list selects everything.
pub fn diff_filtered(
    base: &Snapshot,
    target: &Snapshot,
    filters: &[String],
    mode: MatchMode,
) -> SnapshotDiff {
    let selected = |path: &String| filters.is_empty() || filters.iter().any(|f| mode.matches(f, path));
    let restrict = |snap: &Snapshot| -> Snapshot {
        snap.iter()
            .filter(|(path, _)| selected(*path))
            .map(|(path, id)| (path.clone(), *id))
            .collect()
    };
    diff_snapshots(&restrict(base), &restrict(target)).only_changes()
}

/// Materialize two trees and compare them through [`diff_filtered`].
pub fn diff_trees<S: ObjectStore + ?Sized>(
    store: &S,
    base_tree: &ObjectId,
    target_tree: &ObjectId,
    filters: &[String],
    mode: MatchMode,
) -> DiffResult<SnapshotDiff> {
    let base = materialize(store, base_tree)?;
    let target = materialize(store, target_tree)?;
    Ok(diff_filtered(&base, &target, filters, mode))
}
