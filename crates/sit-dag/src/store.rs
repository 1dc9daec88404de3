//! Commit record storage.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sit_types::CommitId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::commit::Commit;
use crate::error::{GraphError, GraphResult};

/// Storage for mutable commit records, keyed by commit id.
pub trait CommitStore: Send + Sync {
    /// Read a record. Returns `Ok(None)` if it does not exist.
    fn read(&self, id: &CommitId) -> GraphResult<Option<Commit>>;

    /// Create or overwrite the record for `commit.id`.
    fn write(&self, commit: &Commit) -> GraphResult<()>;

    fn exists(&self, id: &CommitId) -> GraphResult<bool>;

    /// Every stored commit id, in ascending hex order.
    fn ids(&self) -> GraphResult<Vec<CommitId>>;
}

/// One file per commit under `.sit/commits/<id>`.
///
/// Each write goes to a temporary file that is renamed over the record, so a
/// rewrite of a parent never leaves a half-written record behind.
#[derive(Clone, Debug)]
pub struct FsCommitStore {
    root: PathBuf,
}

impl FsCommitStore {
    /// Open the record directory, creating it if missing.
    pub fn open(root: impl Into<PathBuf>) -> GraphResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, id: &CommitId) -> PathBuf {
        self.root.join(id.to_hex())
    }
}

impl CommitStore for FsCommitStore {
    fn read(&self, id: &CommitId) -> GraphResult<Option<Commit>> {
        let bytes = match fs::read(self.record_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let text = String::from_utf8(bytes).map_err(|e| GraphError::Corrupt {
            id: id.to_hex(),
            reason: format!("record is not UTF-8: {e}"),
        })?;
        let commit = Commit::decode(&id.to_hex(), &text)?;
        if commit.id != *id {
            return Err(GraphError::Corrupt {
                id: id.to_hex(),
                reason: format!("record names itself {}", commit.id),
            });
        }
        Ok(Some(commit))
    }

    fn write(&self, commit: &Commit) -> GraphResult<()> {
        commit.validate()?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(commit.encode().as_bytes())?;
        tmp.persist(self.record_path(&commit.id))
            .map_err(|e| GraphError::Io(e.error))?;
        debug!(id = %commit.id.short_hex(), succ = commit.succ.len(), "commit record written");
        Ok(())
    }

    fn exists(&self, id: &CommitId) -> GraphResult<bool> {
        Ok(self.record_path(id).is_file())
    }

    fn ids(&self) -> GraphResult<Vec<CommitId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Temporary files and strays are skipped.
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| CommitId::from_hex(name).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// In-memory commit records for tests.
#[derive(Debug, Default)]
pub struct InMemoryCommitStore {
    records: RwLock<BTreeMap<CommitId, Commit>>,
}

impl InMemoryCommitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommitStore for InMemoryCommitStore {
    fn read(&self, id: &CommitId) -> GraphResult<Option<Commit>> {
        Ok(self.records.read().expect("lock poisoned").get(id).cloned())
    }

    fn write(&self, commit: &Commit) -> GraphResult<()> {
        commit.validate()?;
        self.records
            .write()
            .expect("lock poisoned")
            .insert(commit.id, commit.clone());
        Ok(())
    }

    fn exists(&self, id: &CommitId) -> GraphResult<bool> {
        Ok(self.records.read().expect("lock poisoned").contains_key(id))
    }

    fn ids(&self) -> GraphResult<Vec<CommitId>> {
        Ok(self.records.read().expect("lock poisoned").keys().copied().collect())
    }
}
