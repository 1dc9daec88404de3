//! File-backed reference store.
//!
//! Layout under the repository directory (`.sit/`):
//!
//! - `HEAD`: `ref: refs/heads/<branch>` or a literal commit id
//! - `refs/heads/<branch>`: one file per branch holding a commit id
//!
//! Writes are plain overwrites with no lock file; a repository directory is
//! owned by one session at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sit_types::CommitId;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::traits::RefStore;
use crate::types::{Head, HEADS_PREFIX};

/// A [`RefStore`] over the `.sit/` directory layout.
#[derive(Clone, Debug)]
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open the ref store rooted at the repository directory (`.sit`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("HEAD")
    }

    fn heads_dir(&self) -> PathBuf {
        self.root.join(HEADS_PREFIX)
    }

    fn branch_path(&self, name: &str) -> PathBuf {
        self.heads_dir().join(name)
    }

    fn read_commit_file(path: &Path) -> Result<Option<CommitId>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        CommitId::from_hex(text.trim())
            .map(Some)
            .map_err(|e| RefError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl RefStore for FsRefStore {
    fn read_branch(&self, name: &str) -> Result<Option<CommitId>> {
        validate_branch_name(name)?;
        let path = self.branch_path(name);
        if path.is_dir() {
            return Ok(None);
        }
        Self::read_commit_file(&path)
    }

    fn write_branch(&self, name: &str, target: &CommitId) -> Result<()> {
        validate_branch_name(name)?;
        let path = self.branch_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("{target}\n"))?;
        debug!(branch = name, %target, "branch updated");
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<(String, CommitId)>> {
        let dir = self.heads_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut branches = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| {
                RefError::Io(
                    e.into_io_error()
                        .unwrap_or_else(|| io::Error::other("ref directory loop")),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if let Some(id) = Self::read_commit_file(entry.path())? {
                branches.push((name, id));
            }
        }
        branches.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(branches)
    }

    fn head(&self) -> Result<Head> {
        let path = self.head_path();
        let text = fs::read_to_string(&path)?;
        Head::parse(&text).ok_or_else(|| RefError::Corrupt {
            path,
            reason: format!("unrecognized HEAD contents: {:?}", text.trim()),
        })
    }

    fn set_head_branch(&self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        fs::write(self.head_path(), format!("{}\n", Head::Branch(name.to_string()).encode()))?;
        debug!(branch = name, "HEAD attached");
        Ok(())
    }

    fn set_head_detached(&self, target: &CommitId) -> Result<()> {
        fs::write(self.head_path(), format!("{}\n", Head::Detached(*target).encode()))?;
        debug!(%target, "HEAD detached");
        Ok(())
    }
}
