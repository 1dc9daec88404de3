//! The commit graph: allocation, edges, lookup and first-parent traversal.
//!
//! # Successor linking
//!
//! Creating a commit writes the child's record first and then rewrites each
//! predecessor's record to append the child to its `succ` list. A crash
//! between the two leaves the parent's `succ` stale while the child stays
//! reachable through `pred`. [`CommitGraph::repair_successors`] rebuilds
//! every `succ` list from the `pred` edges and closes that gap.

use std::collections::{BTreeMap, HashSet};

use sit_crypto::ContentHasher;
use sit_types::CommitId;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::commit::Commit;
use crate::error::{GraphError, GraphResult};
use crate::store::CommitStore;

/// Commit graph over a [`CommitStore`].
pub struct CommitGraph {
    store: Box<dyn CommitStore>,
}

impl std::fmt::Debug for CommitGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGraph").finish_non_exhaustive()
    }
}

impl CommitGraph {
    pub fn new(store: impl CommitStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Write the root record if it is not there yet.
    pub fn ensure_root(&self) -> GraphResult<()> {
        if !self.store.exists(&CommitId::EMPTY)? {
            self.store.write(&Commit::root())?;
            debug!("root commit record written");
        }
        Ok(())
    }

    /// A fresh commit id: SHA-1 of a time-ordered UUID, never reused.
    pub fn allocate_id(&self) -> GraphResult<CommitId> {
        loop {
            let uuid = Uuid::now_v7();
            let digest = ContentHasher::hash(uuid.as_bytes());
            let id = CommitId::from_bytes(*digest.as_bytes());
            if !id.is_empty() && !self.store.exists(&id)? {
                return Ok(id);
            }
        }
    }

    /// Read a commit, failing if it does not exist.
    pub fn read(&self, id: &CommitId) -> GraphResult<Commit> {
        self.store.read(id)?.ok_or(GraphError::NotFound(*id))
    }

    /// Overwrite a record as-is. Used for amend, which keeps the id.
    pub fn write(&self, commit: &Commit) -> GraphResult<()> {
        self.store.write(commit)
    }

    pub fn exists(&self, id: &CommitId) -> GraphResult<bool> {
        self.store.exists(id)
    }

    /// Persist a new commit and link it from each of its predecessors.
    ///
    /// The child record is durable before any parent is touched. A failed
    /// parent rewrite is logged and returned; the child remains stored.
    pub fn create(&self, commit: &Commit) -> GraphResult<()> {
        self.store.write(commit)?;
        for parent in &commit.pred {
            if let Err(e) = self.link_successor(parent, &commit.id) {
                warn!(
                    parent = %parent.short_hex(),
                    child = %commit.id.short_hex(),
                    error = %e,
                    "successor link failed; run repair to restore it"
                );
                return Err(e);
            }
        }
        info!(id = %commit.id.short_hex(), tree = %commit.tree.short_hex(), "commit created");
        Ok(())
    }

    /// Append `child` to `parent`'s successors. Returns `false` if it was
    /// already listed.
    pub fn link_successor(&self, parent: &CommitId, child: &CommitId) -> GraphResult<bool> {
        let mut record = self.read(parent)?;
        if record.succ.contains(child) {
            return Ok(false);
        }
        record.succ.push(*child);
        self.store.write(&record)?;
        debug!(parent = %parent.short_hex(), child = %child.short_hex(), "successor linked");
        Ok(true)
    }

    /// Expand a full id or unique prefix to a stored commit id.
    pub fn complete_id(&self, prefix: &str) -> GraphResult<CommitId> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GraphError::UnknownPrefix(prefix));
        }
        if let Ok(id) = CommitId::from_hex(&prefix) {
            return if self.store.exists(&id)? {
                Ok(id)
            } else {
                Err(GraphError::UnknownPrefix(prefix))
            };
        }
        let matches: Vec<CommitId> = self
            .store
            .ids()?
            .into_iter()
            .filter(|id| id.to_hex().starts_with(&prefix))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(GraphError::UnknownPrefix(prefix)),
            _ => Err(GraphError::AmbiguousPrefix {
                count: matches.len(),
                prefix,
            }),
        }
    }

    /// Take `steps` first-parent steps back from `start`.
    pub fn ancestor(&self, start: &CommitId, steps: usize) -> GraphResult<CommitId> {
        let mut current = *start;
        for _ in 0..steps {
            current = self
                .read(&current)?
                .first_parent()
                .ok_or(GraphError::HistoryTooShort {
                    start: *start,
                    steps,
                })?;
        }
        Ok(current)
    }

    /// First-parent history from `start`, newest first, excluding the root.
    pub fn log(&self, start: &CommitId) -> GraphResult<Vec<Commit>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut current = *start;
        while !current.is_empty() {
            if !seen.insert(current) {
                return Err(GraphError::Corrupt {
                    id: current.to_hex(),
                    reason: "first-parent chain loops".into(),
                });
            }
            let commit = self.read(&current)?;
            current = commit.first_parent().unwrap_or(CommitId::EMPTY);
            out.push(commit);
        }
        Ok(out)
    }

    /// Rebuild every `succ` list from the `pred` edges of all records.
    ///
    /// Existing successors that are still backed by a `pred` edge keep their
    /// order; missing ones are appended in id order. Returns the number of
    /// records rewritten.
    pub fn repair_successors(&self) -> GraphResult<usize> {
        let mut records = BTreeMap::new();
        for id in self.store.ids()? {
            records.insert(id, self.read(&id)?);
        }

        let mut expected: BTreeMap<CommitId, Vec<CommitId>> = BTreeMap::new();
        for commit in records.values() {
            for parent in &commit.pred {
                let children = expected.entry(*parent).or_default();
                if !children.contains(&commit.id) {
                    children.push(commit.id);
                }
            }
        }

        let mut fixed = 0;
        for (id, mut commit) in records {
            let wanted = expected.remove(&id).unwrap_or_default();
            let mut succ: Vec<CommitId> = commit
                .succ
                .iter()
                .copied()
                .filter(|s| wanted.contains(s))
                .collect();
            for child in wanted {
                if !succ.contains(&child) {
                    succ.push(child);
                }
            }
            if succ != commit.succ {
                warn!(id = %id.short_hex(), before = commit.succ.len(), after = succ.len(), "repairing successors");
                commit.succ = succ;
                self.store.write(&commit)?;
                fixed += 1;
            }
        }

        for (missing, children) in expected {
            warn!(
                parent = %missing.short_hex(),
                children = children.len(),
                "predecessor has no record"
            );
        }
        Ok(fixed)
    }
}
