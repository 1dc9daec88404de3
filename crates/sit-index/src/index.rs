//! The staging index and its on-disk form.
//!
//! The [`Index`] is a `BTreeMap<String, ObjectId>` keyed by forward-slash
//! relative path. Nothing is saved implicitly: every mutating operation in
//! the engine ends with an explicit [`Index::save`].
//!
//! File format (`.sit/index`): line 1 is the decimal entry count, then one
//! line with the path and one line with the blob id per entry, in path order.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sit_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};
use crate::matching::MatchMode;
use crate::Snapshot;

/// The staging area: which blob each tracked path will have in the next commit.
#[derive(Clone, Default)]
pub struct Index {
    entries: Snapshot,
    /// Backing file; `None` for a purely in-memory index.
    path: Option<PathBuf>,
    match_mode: MatchMode,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("path", &self.path)
            .field("match_mode", &self.match_mode)
            .finish()
    }
}

impl Index {
    /// Create an empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index stored at `path`.
    ///
    /// A missing or malformed file yields an empty index bound to `path`;
    /// the next [`save`](Self::save) overwrites it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match Self::parse(&text) {
                Some(entries) => {
                    debug!(path = %path.display(), count = entries.len(), "index loaded");
                    entries
                }
                None => {
                    warn!(path = %path.display(), "malformed index file, starting empty");
                    Snapshot::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Snapshot::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable index file, starting empty");
                Snapshot::new()
            }
        };
        Self {
            entries,
            path: Some(path),
            match_mode: MatchMode::default(),
        }
    }

    /// Write the index back to the file it was loaded from.
    pub fn save(&self) -> IndexResult<()> {
        let path = self.path.as_deref().ok_or(IndexError::NoBackingFile)?;
        self.save_to(path)
    }

    /// Write the index to `path`.
    pub fn save_to(&self, path: &Path) -> IndexResult<()> {
        fs::write(path, self.encode())?;
        debug!(path = %path.display(), count = self.entries.len(), "index saved");
        Ok(())
    }

    /// Builder-style override of the path matching mode.
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.match_mode = mode;
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Serialize to the on-disk text form.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(16 + self.entries.len() * 64);
        let _ = writeln!(out, "{}", self.entries.len());
        for (path, id) in &self.entries {
            let _ = writeln!(out, "{path}");
            let _ = writeln!(out, "{id}");
        }
        out
    }

    /// Parse the on-disk text form, or `None` if it is malformed.
    pub fn parse(text: &str) -> Option<Snapshot> {
        let mut lines = text.lines();
        let count: usize = lines.next()?.trim().parse().ok()?;
        let mut entries = Snapshot::new();
        for _ in 0..count {
            let path = lines.next()?;
            let id = ObjectId::from_hex(lines.next()?.trim()).ok()?;
            if validate_path(path).is_err() {
                return None;
            }
            entries.insert(path.to_string(), id);
        }
        if lines.any(|line| !line.trim().is_empty()) || entries.len() != count {
            return None;
        }
        Some(entries)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The blob staged at exactly `path`.
    pub fn get(&self, path: &str) -> Option<&ObjectId> {
        self.entries.get(path)
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ObjectId)> {
        self.entries.iter()
    }

    /// A copy of the whole staging map.
    pub fn snapshot(&self) -> Snapshot {
        self.entries.clone()
    }

    /// Borrow the staging map.
    pub fn entries(&self) -> &Snapshot {
        &self.entries
    }

    /// Is any entry selected by `prefix`? Never mutates the index.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries
            .keys()
            .any(|path| self.match_mode.matches(prefix, path))
    }

    /// The entries selected by `prefix`.
    pub fn list_prefix(&self, prefix: &str) -> Snapshot {
        self.entries
            .iter()
            .filter(|(path, _)| self.match_mode.matches(prefix, path))
            .map(|(path, id)| (path.clone(), *id))
            .collect()
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Stage `id` at `path`, replacing any previous entry.
    pub fn insert(&mut self, path: &str, id: ObjectId) -> IndexResult<Option<ObjectId>> {
        validate_path(path)?;
        Ok(self.entries.insert(path.to_string(), id))
    }

    /// Remove exactly `path`.
    pub fn remove(&mut self, path: &str) -> Option<ObjectId> {
        self.entries.remove(path)
    }

    /// Remove every entry selected by `prefix`, returning how many were removed.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let mode = self.match_mode;
        let before = self.entries.len();
        self.entries.retain(|path, _| !mode.matches(prefix, path));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Check that `path` is a non-empty, relative, forward-slash path with no
/// empty, `.` or `..` components and no line breaks.
pub fn validate_path(path: &str) -> IndexResult<()> {
    let bad = path.is_empty()
        || path.contains('\n')
        || path.contains('\r')
        || path
            .split('/')
            .any(|c| c.is_empty() || c == "." || c == "..");
    if bad {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(())
}
