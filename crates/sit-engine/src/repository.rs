use std::fs;
use std::path::{Path, PathBuf};

use sit_crypto::ContentHasher;
use sit_dag::{Commit, CommitGraph, FsCommitStore};
use sit_index::{materialize, Index, MatchMode, Snapshot};
use sit_refs::{validate_branch_name, FsRefStore, Head, RefStore};
use sit_store::{FsObjectStore, ObjectStore, StoreError};
use sit_types::{CommitId, ObjectId};
use tracing::{info, warn};

use crate::config::{Config, EngineSettings};
use crate::error::{EngineError, EngineResult};
use crate::worktree;

/// Name of the repository directory at the work-tree root.
pub const SIT_DIR: &str = ".sit";

const DEFAULT_BRANCH: &str = "master";

/// Where a snapshot of paths and blob ids comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotSource {
    /// The live staging index.
    Index,
    /// Files on disk, hashed but not stored.
    Worktree,
    /// A commit's tree.
    Commit(CommitId),
}

/// An open repository session.
pub struct Repository {
    root: PathBuf,
    sit_dir: PathBuf,
    pub(crate) store: FsObjectStore,
    pub(crate) graph: CommitGraph,
    pub(crate) refs: FsRefStore,
    pub(crate) index: Index,
    config: Config,
    settings: EngineSettings,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("index", &self.index)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Create a repository in `dir` and open it.
    ///
    /// Refuses to touch an existing `.sit`.
    pub fn init(dir: &Path) -> EngineResult<Self> {
        let sit_dir = dir.join(SIT_DIR);
        if sit_dir.is_dir() {
            return Err(EngineError::AlreadyInitialized(dir.to_path_buf()));
        }
        if sit_dir.exists() {
            return Err(EngineError::NotADirectory(sit_dir));
        }

        fs::create_dir_all(sit_dir.join("objects"))?;
        fs::create_dir_all(sit_dir.join("commits"))?;
        fs::create_dir_all(sit_dir.join("refs/heads"))?;

        let refs = FsRefStore::new(&sit_dir);
        refs.write_branch(DEFAULT_BRANCH, &CommitId::EMPTY)?;
        refs.set_head_branch(DEFAULT_BRANCH)?;
        fs::write(sit_dir.join("COMMIT_MSG"), "")?;
        fs::write(sit_dir.join("config"), "")?;
        Index::load(sit_dir.join("index")).save()?;

        let graph = CommitGraph::new(FsCommitStore::open(sit_dir.join("commits"))?);
        graph.ensure_root()?;

        info!(root = %dir.display(), "initialized empty repository");
        Self::open(dir)
    }

    /// Open the repository whose work tree is exactly `root`.
    pub fn open(root: &Path) -> EngineResult<Self> {
        let root = root.canonicalize()?;
        let sit_dir = root.join(SIT_DIR);
        if !sit_dir.is_dir() {
            return Err(EngineError::NotARepository(root));
        }

        let config = Config::load(sit_dir.join("config"))?;
        let settings = EngineSettings::from_config(&config)?;
        let index = Index::load(sit_dir.join("index")).with_match_mode(settings.path_match);

        Ok(Self {
            store: FsObjectStore::open(sit_dir.join("objects"))?,
            graph: CommitGraph::new(FsCommitStore::open(sit_dir.join("commits"))?),
            refs: FsRefStore::new(&sit_dir),
            index,
            config,
            settings,
            sit_dir,
            root,
        })
    }

    /// Open the repository containing `start` or one of its ancestors.
    pub fn discover(start: &Path) -> EngineResult<Self> {
        let start = start.canonicalize()?;
        for dir in start.ancestors() {
            if dir.join(SIT_DIR).is_dir() {
                return Self::open(dir);
            }
        }
        Err(EngineError::NotARepository(start))
    }

    // ---- Accessors ----

    /// The work-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.sit` directory.
    pub fn sit_dir(&self) -> &Path {
        &self.sit_dir
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn match_mode(&self) -> MatchMode {
        self.settings.path_match
    }

    pub fn store(&self) -> &FsObjectStore {
        &self.store
    }

    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    pub fn refs(&self) -> &FsRefStore {
        &self.refs
    }

    // ---- Paths and revisions ----

    /// Normalise a user path to the index's forward-slash relative form.
    pub fn relativize(&self, path: &Path) -> EngineResult<String> {
        worktree::relativize(&self.root, path)
    }

    /// Resolve `HEAD`, a branch, or a commit id prefix, each optionally
    /// followed by `~N` first-parent steps (`~` alone is one step).
    pub fn resolve_revision(&self, rev: &str) -> EngineResult<CommitId> {
        let rev = rev.trim();
        let (base, steps) = match rev.split_once('~') {
            Some((base, "")) => (base, 1),
            Some((base, n)) => (
                base,
                n.parse::<usize>()
                    .map_err(|_| EngineError::UnknownRevision(rev.to_string()))?,
            ),
            None => (rev, 0),
        };

        let start = if base == "HEAD" {
            self.refs.resolve_head()?
        } else if let Some(id) = self.branch_tip(base)? {
            id
        } else {
            self.graph.complete_id(base).map_err(|e| match e {
                sit_dag::GraphError::UnknownPrefix(_) => {
                    EngineError::UnknownRevision(rev.to_string())
                }
                other => other.into(),
            })?
        };
        Ok(self.graph.ancestor(&start, steps)?)
    }

    /// The tip of `name` if it is an existing branch.
    pub(crate) fn branch_tip(&self, name: &str) -> EngineResult<Option<CommitId>> {
        if validate_branch_name(name).is_err() {
            return Ok(None);
        }
        Ok(self.refs.read_branch(name)?)
    }

    pub fn head(&self) -> EngineResult<Head> {
        Ok(self.refs.head()?)
    }

    pub fn head_commit(&self) -> EngineResult<CommitId> {
        Ok(self.refs.resolve_head()?)
    }

    // ---- Snapshots ----

    /// Materialize the path map of `source`.
    pub fn snapshot(&self, source: SnapshotSource) -> EngineResult<Snapshot> {
        match source {
            SnapshotSource::Index => Ok(self.index.snapshot()),
            SnapshotSource::Commit(id) => self.commit_snapshot(&id),
            SnapshotSource::Worktree => self.worktree_snapshot(),
        }
    }

    pub(crate) fn commit_snapshot(&self, id: &CommitId) -> EngineResult<Snapshot> {
        let commit = self.graph.read(id)?;
        Ok(materialize(&self.store, &commit.tree)?)
    }

    /// Hash every file in the work tree. Unreadable files are left out.
    pub(crate) fn worktree_snapshot(&self) -> EngineResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        for (rel, abs) in worktree::list_files(&self.root, &self.root)? {
            match ContentHasher::hash_file(&abs) {
                Ok(id) => {
                    snapshot.insert(rel, id);
                }
                Err(e) => warn!(path = %rel, error = %e, "cannot hash work-tree file"),
            }
        }
        Ok(snapshot)
    }

    /// Read the content behind `id`: from the store, or from the work-tree
    /// file at `path` when the blob was only hashed.
    pub fn read_content(&self, path: &str, id: &ObjectId) -> EngineResult<Vec<u8>> {
        if let Some(data) = self.store.read(id)? {
            return Ok(data);
        }
        let data = fs::read(worktree::absolute(&self.root, path))?;
        if ContentHasher::verify(&data, id) {
            Ok(data)
        } else {
            Err(StoreError::NotFound(*id).into())
        }
    }

    // ---- History ----

    pub fn show(&self, rev: &str) -> EngineResult<Commit> {
        let id = self.resolve_revision(rev)?;
        Ok(self.graph.read(&id)?)
    }

    /// First-parent history from `rev`, newest first, at most `limit` entries.
    pub fn log(&self, rev: &str, limit: Option<usize>) -> EngineResult<Vec<Commit>> {
        let id = self.resolve_revision(rev)?;
        let mut history = self.graph.log(&id)?;
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        Ok(history)
    }

    /// Rebuild successor lists lost to an interrupted commit.
    pub fn repair_successors(&self) -> EngineResult<usize> {
        let fixed = self.graph.repair_successors()?;
        info!(fixed, "successor repair finished");
        Ok(fixed)
    }

    // ---- Branches ----

    pub fn branches(&self) -> EngineResult<Vec<(String, CommitId)>> {
        Ok(self.refs.list_branches()?)
    }

    pub fn current_branch(&self) -> EngineResult<Option<String>> {
        Ok(self.refs.current_branch()?)
    }

    /// Create `name` at `at` (a revision), or at HEAD.
    pub fn create_branch(&self, name: &str, at: Option<&str>) -> EngineResult<CommitId> {
        let target = match at {
            Some(rev) => self.resolve_revision(rev)?,
            None => self.refs.resolve_head()?,
        };
        self.refs.create_branch(name, &target)?;
        info!(branch = name, target = %target.short_hex(), "branch created");
        Ok(target)
    }

    // ---- Configuration ----

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_get(&self, key: &str) -> Option<String> {
        self.config.get(key)
    }

    /// Set and save a key. Settings are re-derived, so a bad value is
    /// refused before it reaches disk.
    pub fn config_set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let mut config = self.config.clone();
        config.set(key, value)?;
        let settings = EngineSettings::from_config(&config)?;
        config.save()?;
        self.index.set_match_mode(settings.path_match);
        self.config = config;
        self.settings = settings;
        Ok(())
    }

    pub(crate) fn commit_msg_path(&self) -> PathBuf {
        self.sit_dir.join("COMMIT_MSG")
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

    #[test]
    fn init_layout() {
        let (dir, repo) = repo();
        let sit = dir.path().join(SIT_DIR);
        for sub in ["objects", "commits", "refs/heads"] {
            assert!(sit.join(sub).is_dir(), "{sub}");
        }
        assert_eq!(fs::read_to_string(sit.join("HEAD")).unwrap(), "ref: refs/heads/master\n");
        assert_eq!(
            fs::read_to_string(sit.join("refs/heads/master")).unwrap().trim(),
            "0".repeat(40)
        );
        assert!(sit.join("commits").join("0".repeat(40)).is_file());
        assert_eq!(fs::read_to_string(sit.join("COMMIT_MSG")).unwrap(), "");
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("master"));
    }

    #[test]
    fn init_twice_refused() {
        let (dir, _repo) = repo();
        assert!(matches!(
            Repository::init(dir.path()),
            Err(EngineError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn init_over_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SIT_DIR), "not a dir").unwrap();
        let err = Repository::init(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::NotADirectory(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn discover_from_subdirectory() {
        let (dir, repo) = repo();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let found = Repository::discover(&nested).unwrap();
        assert_eq!(found.root(), repo.root());
    }

    #[test]
    fn discover_outside_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::discover(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::NotARepository(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn revisions() {
        let (_dir, repo) = repo();
        assert_eq!(repo.resolve_revision("HEAD").unwrap(), CommitId::EMPTY);
        assert_eq!(repo.resolve_revision("master").unwrap(), CommitId::EMPTY);
        assert_eq!(repo.resolve_revision(&"0".repeat(8)).unwrap(), CommitId::EMPTY);
        assert!(matches!(
            repo.resolve_revision("nonsense"),
            Err(EngineError::UnknownRevision(_))
        ));
        assert!(matches!(
            repo.resolve_revision("HEAD~x"),
            Err(EngineError::UnknownRevision(_))
        ));
        assert!(repo.resolve_revision("HEAD~").is_err());
    }

    #[test]
    fn branches_created_at_head() {
        let (_dir, repo) = repo();
        assert_eq!(repo.create_branch("dev", None).unwrap(), CommitId::EMPTY);
        let names: Vec<_> = repo.branches().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["dev", "master"]);
        assert!(repo.create_branch("dev", None).is_err());
        assert!(repo.create_branch("HEAD", None).is_err());
    }

    #[test]
    fn config_set_validates_and_persists() {
        let (dir, mut repo) = repo();
        repo.config_set("user.name", "Ada").unwrap();
        assert!(repo.config_set("core.path_match", "fuzzy").is_err());
        assert_eq!(repo.config_get("core.path_match"), None);
        repo.config_set("core.path_match", "raw").unwrap();
        assert_eq!(repo.match_mode(), MatchMode::Raw);
        assert_eq!(repo.index().match_mode(), MatchMode::Raw);

        let reopened = Repository::open(dir.path()).unwrap();
        assert_eq!(reopened.config_get("user.name").as_deref(), Some("Ada"));
        assert_eq!(reopened.match_mode(), MatchMode::Raw);
    }

    #[test]
    fn worktree_snapshot_hashes_without_storing() {
        let (dir, repo) = repo();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let snap = repo.snapshot(SnapshotSource::Worktree).unwrap();
        let id = snap["a.txt"];
        assert_eq!(id, ContentHasher::hash(b"hello"));
        assert!(!repo.store().exists(&id).unwrap());
        assert_eq!(repo.read_content("a.txt", &id).unwrap(), b"hello");
    }
}
