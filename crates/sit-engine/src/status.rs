//! Working-state summary and snapshot comparison.

use serde::{Deserialize, Serialize};
use sit_diff::{diff_filtered, diff_snapshots, SnapshotDiff};
use sit_index::Snapshot;
use sit_types::CommitId;

use crate::error::EngineResult;
use crate::repository::{Repository, SnapshotSource};

/// Where the work tree and index stand relative to HEAD.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Current branch, `None` when HEAD is detached.
    pub branch: Option<String>,
    pub head: CommitId,
    /// HEAD's tree against the index.
    pub staged: SnapshotDiff,
    /// The index against the work tree, tracked paths only.
    pub unstaged: SnapshotDiff,
    /// Files on disk the index does not track.
    pub untracked: Vec<String>,
}

impl Status {
    /// Nothing staged and no tracked file modified or deleted. Untracked
    /// files do not count.
    pub fn is_clean(&self) -> bool {
        self.staged.is_clean() && self.unstaged.is_clean()
    }
}

impl Repository {
    pub fn status(&self) -> EngineResult<Status> {
        let head = self.head_commit()?;
        let committed = self.snapshot(SnapshotSource::Commit(head))?;
        let staged = self.index().snapshot();
        let on_disk = self.worktree_snapshot()?;

        let tracked_on_disk: Snapshot = staged
            .keys()
            .filter_map(|path| on_disk.get(path).map(|id| (path.clone(), *id)))
            .collect();
        let untracked = on_disk
            .keys()
            .filter(|path| !staged.contains_key(*path))
            .cloned()
            .collect();

        Ok(Status {
            branch: self.current_branch()?,
            head,
            staged: diff_snapshots(&committed, &staged).only_changes(),
            unstaged: diff_snapshots(&staged, &tracked_on_disk).only_changes(),
            untracked,
        })
    }

    /// Changed paths between two snapshots, restricted to `filters` (paths
    /// relative to the work-tree root or absolute). No filters means all.
    pub fn diff(
        &self,
        base: SnapshotSource,
        target: SnapshotSource,
        filters: &[std::path::PathBuf],
    ) -> EngineResult<SnapshotDiff> {
        let filters = filters
            .iter()
            .map(|f| self.relativize(f))
            .collect::<EngineResult<Vec<_>>>()?;
        let base = self.snapshot(base)?;
        let target = self.snapshot(target)?;
        Ok(diff_filtered(&base, &target, &filters, self.match_mode()))
    }
}
