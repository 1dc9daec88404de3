//! Reconciliation of the work tree, the index and commit snapshots.
//!
//! Each operation reads two of the three and drives the third into
//! agreement. Checkout refuses to run over staged or modified work, and
//! reset only ever rewrites the index unless `hard` is requested.
//!
//! Reset classifies every selected path by where it appears:
//!
//! | commit | index | index action         | work tree (hard only)  |
//! |--------|-------|----------------------|------------------------|
//! | yes    | no    | insert commit's blob | write commit's blob    |
//! | no     | yes   | remove entry         | delete file            |
//! | yes    | yes   | replace with commit's| write commit's blob    |
//! | no     | no    | error: not tracked   | none                   |

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sit_index::{validate_path, Snapshot};
use sit_refs::{validate_branch_name, RefError, RefStore};
use sit_store::ObjectStore;
use sit_types::{CommitId, ObjectId};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::repository::{Repository, SnapshotSource};
use crate::worktree;

/// Outcome of [`Repository::add`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReport {
    /// Paths staged (new or updated).
    pub added: Vec<String>,
    /// Paths unstaged because they are gone from disk.
    pub removed: Vec<String>,
    /// Files that could not be stored, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Files above the warning size that were still added.
    pub large: Vec<String>,
}

/// What a checkout reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// The staging index.
    Index,
    /// A branch; a whole checkout attaches HEAD to it.
    Branch(String),
    /// A commit; a whole checkout detaches HEAD there.
    Commit(CommitId),
}

/// Outcome of a whole-repository checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReport {
    /// The commit checked out, or `None` for the index.
    pub commit: Option<CommitId>,
    /// Tracked files deleted before writing.
    pub removed: usize,
    /// Files written from the target snapshot.
    pub written: usize,
    /// Branch HEAD is attached to afterwards, if any.
    pub branch: Option<String>,
}

/// Row of the reset table a path fell into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetKind {
    /// In the commit only: re-inserted into the index.
    Restage,
    /// In the index only: removed from the index.
    Unstage,
    /// In both: index entry replaced by the commit's blob.
    Replace,
}

/// One path touched by a reset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetAction {
    pub path: String,
    pub kind: ResetKind,
    /// Index entry before the reset.
    pub old: Option<ObjectId>,
    /// Index entry after the reset.
    pub new: Option<ObjectId>,
}

impl ResetAction {
    /// Whether the index entry actually changed.
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

impl Repository {
    /// Resolve a checkout argument: `index`, a branch, or any revision.
    pub fn checkout_target(&self, rev: &str) -> EngineResult<CheckoutTarget> {
        if rev == "index" {
            return Ok(CheckoutTarget::Index);
        }
        if self.branch_tip(rev)?.is_some() {
            return Ok(CheckoutTarget::Branch(rev.to_string()));
        }
        Ok(CheckoutTarget::Commit(self.resolve_revision(rev)?))
    }

    fn target_commit(&self, target: &CheckoutTarget) -> EngineResult<Option<CommitId>> {
        match target {
            CheckoutTarget::Index => Ok(None),
            CheckoutTarget::Branch(name) => self
                .branch_tip(name)?
                .map(Some)
                .ok_or_else(|| RefError::NotFound { name: name.clone() }.into()),
            CheckoutTarget::Commit(id) => Ok(Some(*id)),
        }
    }

    fn target_snapshot(&self, target: &CheckoutTarget) -> EngineResult<Snapshot> {
        match self.target_commit(target)? {
            Some(id) => self.snapshot(SnapshotSource::Commit(id)),
            None => self.snapshot(SnapshotSource::Index),
        }
    }

    // ---- Add / rm ----

    /// Stage files and directories.
    ///
    /// Directories are expanded to their files. A path that no longer exists
    /// unstages everything under it, and is an error if nothing was tracked
    /// there. File sizes are checked for every path before the index is
    /// touched; individual files that then fail to store are skipped.
    pub fn add<P: AsRef<Path>>(&mut self, paths: &[P]) -> EngineResult<AddReport> {
        struct Plan {
            rel: String,
            files: Vec<(String, PathBuf)>,
        }

        let mut plans = Vec::new();
        for path in paths {
            let rel = self.relativize(path.as_ref())?;
            let abs = worktree::absolute(self.root(), &rel);
            let files = if fs::symlink_metadata(&abs).is_ok() {
                worktree::list_files(self.root(), &abs)?
            } else {
                if !self.index.contains_prefix(&rel) {
                    return Err(EngineError::NoSuchPath(rel));
                }
                Vec::new()
            };
            plans.push(Plan { rel, files });
        }

        let mut report = AddReport::default();
        for (rel, abs) in plans.iter().flat_map(|p| p.files.iter()) {
            let Ok(meta) = fs::metadata(abs) else {
                continue;
            };
            let size = meta.len();
            if size > self.settings().large_file_limit {
                return Err(EngineError::FileTooLarge {
                    path: rel.clone(),
                    size,
                    limit: self.settings().large_file_limit,
                });
            }
            if size > self.settings().large_file_warn {
                warn!(path = %rel, size, "adding a large file");
                report.large.push(rel.clone());
            }
        }

        for plan in &plans {
            let present: BTreeSet<&str> = plan.files.iter().map(|(rel, _)| rel.as_str()).collect();
            for gone in self.index.list_prefix(&plan.rel).into_keys() {
                if !present.contains(gone.as_str()) {
                    self.index.remove(&gone);
                    report.removed.push(gone);
                }
            }
            for (rel, abs) in &plan.files {
                match self.stage_file(rel, abs) {
                    Ok(true) => report.added.push(rel.clone()),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(path = %rel, error = %e, "skipping file");
                        report.skipped.push((rel.clone(), e.to_string()));
                    }
                }
            }
        }

        self.index.save()?;
        info!(
            added = report.added.len(),
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            "add finished"
        );
        Ok(report)
    }

    /// Store one file and stage it. Returns whether the index entry changed.
    fn stage_file(&mut self, rel: &str, abs: &Path) -> EngineResult<bool> {
        validate_path(rel)?;
        let id = self.store.import_file(abs)?;
        Ok(self.index.insert(rel, id)? != Some(id))
    }

    /// Unstage everything under each path. Files on disk are kept.
    pub fn rm<P: AsRef<Path>>(&mut self, paths: &[P]) -> EngineResult<Vec<String>> {
        let mut prefixes = Vec::new();
        for path in paths {
            let rel = self.relativize(path.as_ref())?;
            if !self.index.contains_prefix(&rel) {
                return Err(EngineError::Untracked(rel));
            }
            prefixes.push(rel);
        }

        let mut removed = Vec::new();
        for prefix in &prefixes {
            let matched = self.index.list_prefix(prefix);
            self.index.remove_prefix(prefix);
            removed.extend(matched.into_keys());
        }
        self.index.save()?;
        info!(removed = removed.len(), "rm finished");
        Ok(removed)
    }

    // ---- Checkout ----

    /// Replace the work tree and index with `target`'s snapshot.
    ///
    /// Requires a clean status and no untracked file in the way of the
    /// target. Every tracked file is deleted first, then the snapshot is
    /// written out and staged. With `new_branch`, a branch
    /// is created at the target commit (or HEAD for the index) and HEAD is
    /// attached to it; otherwise a branch target attaches HEAD and a commit
    /// target detaches it.
    pub fn checkout(
        &mut self,
        target: &CheckoutTarget,
        new_branch: Option<&str>,
    ) -> EngineResult<CheckoutReport> {
        if let Some(name) = new_branch {
            validate_branch_name(name)?;
            if self.refs.read_branch(name)?.is_some() {
                return Err(RefError::AlreadyExists { name: name.to_string() }.into());
            }
        }
        if !self.status()?.is_clean() {
            return Err(EngineError::DirtyWorkTree);
        }

        let commit = self.target_commit(target)?;
        let snapshot = self.target_snapshot(target)?;
        if let Some(blocked) = self.blocked_path(&snapshot)? {
            return Err(EngineError::CheckoutConflict(blocked));
        }

        let mut removed = 0;
        let tracked: Vec<String> = self.index.entries().keys().cloned().collect();
        for rel in &tracked {
            let abs = worktree::absolute(self.root(), rel);
            if worktree::remove_file(&abs)? {
                removed += 1;
            }
            if let Some(parent) = abs.parent() {
                worktree::remove_empty_dirs(parent, self.root())?;
            }
        }
        self.index.clear();

        for (rel, id) in &snapshot {
            self.store.export_to(id, &worktree::absolute(self.root(), rel))?;
            self.index.insert(rel, *id)?;
        }
        self.index.save()?;

        let branch = match (new_branch, target) {
            (Some(name), _) => {
                let at = match commit {
                    Some(id) => id,
                    None => self.refs.resolve_head()?,
                };
                self.refs.create_branch(name, &at)?;
                self.refs.set_head_branch(name)?;
                Some(name.to_string())
            }
            (None, CheckoutTarget::Branch(name)) => {
                self.refs.set_head_branch(name)?;
                Some(name.clone())
            }
            (None, CheckoutTarget::Commit(id)) => {
                self.refs.set_head_detached(id)?;
                None
            }
            (None, CheckoutTarget::Index) => self.refs.current_branch()?,
        };

        info!(
            commit = ?commit.map(|c| c.short_hex()),
            removed,
            written = snapshot.len(),
            "checkout finished"
        );
        Ok(CheckoutReport {
            commit,
            removed,
            written: snapshot.len(),
            branch,
        })
    }

    /// The first untracked work-tree entry that writing `snapshot` would
    /// collide with: a file where a directory is needed, or a directory
    /// holding untracked files where a file is needed.
    fn blocked_path(&self, snapshot: &Snapshot) -> EngineResult<Option<String>> {
        let tracked = self.index.entries();
        for rel in snapshot.keys() {
            let parts: Vec<&str> = rel.split('/').collect();
            let mut dir = String::new();
            for part in &parts[..parts.len() - 1] {
                if !dir.is_empty() {
                    dir.push('/');
                }
                dir.push_str(part);
                let Ok(meta) = fs::symlink_metadata(worktree::absolute(self.root(), &dir)) else {
                    break;
                };
                if !meta.is_dir() && !tracked.contains_key(&dir) {
                    return Ok(Some(dir));
                }
            }

            let abs = worktree::absolute(self.root(), rel);
            if abs.is_dir() {
                let untracked = worktree::list_files(self.root(), &abs)?
                    .into_iter()
                    .any(|(path, _)| !tracked.contains_key(&path));
                if untracked {
                    return Ok(Some(rel.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Overwrite the file at `path`, or every file under it, from `target`.
    /// The index and HEAD are left alone.
    pub fn checkout_path(&self, target: &CheckoutTarget, path: &Path) -> EngineResult<Vec<String>> {
        let rel = self.relativize(path)?;
        let snapshot = self.target_snapshot(target)?;
        let mode = self.match_mode();
        let selected: Vec<(&String, &ObjectId)> = match snapshot.get_key_value(&rel) {
            Some(exact) => vec![exact],
            None => snapshot
                .iter()
                .filter(|(p, _)| mode.matches(&rel, p))
                .collect(),
        };
        if selected.is_empty() {
            return Err(EngineError::Untracked(rel));
        }

        let mut written = Vec::with_capacity(selected.len());
        for (p, id) in selected {
            self.store.export_to(id, &worktree::absolute(self.root(), p))?;
            debug!(path = %p, blob = %id.short_hex(), "file restored");
            written.push(p.clone());
        }
        Ok(written)
    }

    // ---- Reset ----

    /// Path-scoped reset: align index entries under `path` with `target`.
    /// Never touches the work tree or refs.
    pub fn reset_path(&mut self, target: &CommitId, path: &Path) -> EngineResult<Vec<ResetAction>> {
        if path.as_os_str().is_empty() {
            return Err(EngineError::MissingPath);
        }
        let rel = self.relativize(path)?;
        let mode = self.match_mode();
        let in_commit: Snapshot = self
            .commit_snapshot(target)?
            .into_iter()
            .filter(|(p, _)| mode.matches(&rel, p))
            .collect();
        let in_index = self.index.list_prefix(&rel);
        if in_commit.is_empty() && in_index.is_empty() {
            return Err(EngineError::Untracked(rel));
        }

        let actions = self.apply_reset(&in_commit, &in_index, false)?;
        self.index.save()?;
        info!(target = %target.short_hex(), path = %rel, actions = actions.len(), "reset finished");
        Ok(actions)
    }

    /// Whole-repository reset to `target`, then move the current branch (or
    /// detached HEAD) there. With `hard`, the work tree follows the index.
    pub fn reset(&mut self, target: &CommitId, hard: bool) -> EngineResult<Vec<ResetAction>> {
        let in_commit = self.commit_snapshot(target)?;
        let in_index = self.index.snapshot();

        let actions = self.apply_reset(&in_commit, &in_index, hard)?;
        self.index.save()?;
        self.refs.advance_head(target)?;
        info!(target = %target.short_hex(), hard, actions = actions.len(), "reset finished");
        Ok(actions)
    }

    fn apply_reset(
        &mut self,
        in_commit: &Snapshot,
        in_index: &Snapshot,
        hard: bool,
    ) -> EngineResult<Vec<ResetAction>> {
        let paths: BTreeSet<&String> = in_commit.keys().chain(in_index.keys()).collect();
        let mut actions = Vec::with_capacity(paths.len());
        for path in paths {
            let old = in_index.get(path).copied();
            let new = in_commit.get(path).copied();
            let kind = match (new, old) {
                (Some(_), None) => ResetKind::Restage,
                (None, Some(_)) => ResetKind::Unstage,
                (Some(_), Some(_)) => ResetKind::Replace,
                (None, None) => return Err(EngineError::Untracked(path.clone())),
            };

            let abs = worktree::absolute(self.root(), path);
            match new {
                Some(id) => {
                    self.index.insert(path, id)?;
                    if hard {
                        self.store.export_to(&id, &abs)?;
                    }
                }
                None => {
                    self.index.remove(path);
                    if hard {
                        worktree::remove_file(&abs)?;
                        if let Some(parent) = abs.parent() {
                            worktree::remove_empty_dirs(parent, self.root())?;
                        }
                    }
                }
            }
            actions.push(ResetAction {
                path: path.clone(),
                kind,
                old,
                new,
            });
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn add_directory_expands_files() {
        let (dir, mut repo) = repo();
        write(dir.path(), "src/a.rs", "a");
        write(dir.path(), "src/sub/b.rs", "b");
        let report = repo.add(&["src"]).unwrap();
        assert_eq!(report.added, ["src/a.rs", "src/sub/b.rs"]);
        assert_eq!(repo.index().len(), 2);

        let again = repo.add(&["src"]).unwrap();
        assert!(again.added.is_empty());
    }

    #[test]
    fn add_missing_path_unstages_or_errors() {
        let (dir, mut repo) = repo();
        write(dir.path(), "d/x", "x");
        write(dir.path(), "d/y", "y");
        repo.add(&["d"]).unwrap();

        fs::remove_file(dir.path().join("d/x")).unwrap();
        let report = repo.add(&["d"]).unwrap();
        assert_eq!(report.removed, ["d/x"]);
        assert!(repo.index().get("d/y").is_some());

        fs::remove_dir_all(dir.path().join("d")).unwrap();
        repo.add(&["d"]).unwrap();
        assert!(repo.index().is_empty());

        assert!(matches!(repo.add(&["d"]), Err(EngineError::NoSuchPath(_))));
    }

    #[test]
    fn add_skips_unstageable_file_and_keeps_siblings() {
        let (dir, mut repo) = repo();
        write(dir.path(), "d/good.txt", "good");
        write(dir.path(), "d/bad\nname", "bad");

        let report = repo.add(&["d"]).unwrap();
        assert_eq!(report.added, ["d/good.txt"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "d/bad\nname");
        assert!(repo.index().get("d/bad\nname").is_none());

        let reopened = Repository::open(dir.path()).unwrap();
        assert_eq!(reopened.index().len(), 1);
        assert!(reopened.index().get("d/good.txt").is_some());
    }

    #[test]
    fn oversize_file_rejected_before_mutation() {
        let (dir, mut repo) = repo();
        repo.config_set("core.large_file_warn", "4").unwrap();
        repo.config_set("core.large_file_limit", "8").unwrap();
        write(dir.path(), "ok.txt", "12345");
        write(dir.path(), "big.txt", "123456789");

        let err = repo.add(&["ok.txt", "big.txt"]).unwrap_err();
        assert!(matches!(err, EngineError::FileTooLarge { size: 9, limit: 8, .. }));
        assert!(repo.index().is_empty());

        let report = repo.add(&["ok.txt"]).unwrap();
        assert_eq!(report.large, ["ok.txt"]);
    }

    #[test]
    fn rm_keeps_file_on_disk() {
        let (dir, mut repo) = repo();
        write(dir.path(), "keep/me.txt", "k");
        repo.add(&["keep"]).unwrap();
        assert_eq!(repo.rm(&["keep"]).unwrap(), ["keep/me.txt"]);
        assert!(repo.index().is_empty());
        assert!(dir.path().join("keep/me.txt").is_file());
        assert!(matches!(repo.rm(&["keep"]), Err(EngineError::Untracked(_))));
    }

    #[test]
    fn component_matching_for_add_removal() {
        let (dir, mut repo) = repo();
        write(dir.path(), "foo", "1");
        write(dir.path(), "foobar.txt", "2");
        repo.add(&["."]).unwrap();
        fs::remove_file(dir.path().join("foo")).unwrap();
        repo.add(&["foo"]).unwrap();
        assert!(repo.index().get("foobar.txt").is_some());
        assert!(repo.index().get("foo").is_none());
    }

    #[test]
    fn checkout_path_from_index_leaves_index() {
        let (dir, mut repo) = repo();
        write(dir.path(), "a.txt", "staged");
        repo.add(&["a.txt"]).unwrap();
        write(dir.path(), "a.txt", "scribbled");
        let before = repo.index().snapshot();

        let written = repo.checkout_path(&CheckoutTarget::Index, Path::new("a.txt")).unwrap();
        assert_eq!(written, ["a.txt"]);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "staged");
        assert_eq!(repo.index().snapshot(), before);

        assert!(matches!(
            repo.checkout_path(&CheckoutTarget::Index, Path::new("nope")),
            Err(EngineError::Untracked(_))
        ));
    }

    #[test]
    fn checkout_target_parsing() {
        let (_dir, repo) = repo();
        assert_eq!(repo.checkout_target("index").unwrap(), CheckoutTarget::Index);
        assert_eq!(
            repo.checkout_target("master").unwrap(),
            CheckoutTarget::Branch("master".into())
        );
        assert_eq!(
            repo.checkout_target("HEAD").unwrap(),
            CheckoutTarget::Commit(CommitId::EMPTY)
        );
        assert!(repo.checkout_target("missing").is_err());
    }

    #[test]
    fn reset_path_requires_path() {
        let (_dir, mut repo) = repo();
        assert!(matches!(
            repo.reset_path(&CommitId::EMPTY, Path::new("")),
            Err(EngineError::MissingPath)
        ));
        assert!(matches!(
            repo.reset_path(&CommitId::EMPTY, Path::new("ghost")),
            Err(EngineError::Untracked(_))
        ));
    }
}
