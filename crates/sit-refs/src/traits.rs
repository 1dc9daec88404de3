//! The [`RefStore`] trait defining the reference storage interface.

use sit_types::CommitId;

use crate::error::{RefError, Result};
use crate::types::Head;

/// Storage backend for branches and HEAD.
///
/// Branch names are short names (`master`, `feature/x`); backends map them
/// to `refs/heads/<name>`. Implementations validate names on write.
pub trait RefStore: Send + Sync {
    /// Read a branch tip. Returns `Ok(None)` if the branch does not exist.
    fn read_branch(&self, name: &str) -> Result<Option<CommitId>>;

    /// Create or move a branch.
    fn write_branch(&self, name: &str, target: &CommitId) -> Result<()>;

    /// All branches, sorted by name.
    fn list_branches(&self) -> Result<Vec<(String, CommitId)>>;

    /// Read the current HEAD state.
    fn head(&self) -> Result<Head>;

    /// Point HEAD at a branch (symbolic ref).
    fn set_head_branch(&self, name: &str) -> Result<()>;

    /// Detach HEAD at a commit.
    fn set_head_detached(&self, target: &CommitId) -> Result<()>;

    /// The branch HEAD names, or `None` when detached.
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.head()?.branch().map(str::to_string))
    }

    /// The commit HEAD ultimately points at.
    fn resolve_head(&self) -> Result<CommitId> {
        match self.head()? {
            Head::Detached(id) => Ok(id),
            Head::Branch(name) => self
                .read_branch(&name)?
                .ok_or(RefError::NotFound { name }),
        }
    }

    /// Create a new branch, failing if it already exists.
    fn create_branch(&self, name: &str, target: &CommitId) -> Result<()> {
        if self.read_branch(name)?.is_some() {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        self.write_branch(name, target)
    }

    /// Move whatever HEAD points at: the current branch, or HEAD itself when
    /// detached.
    fn advance_head(&self, target: &CommitId) -> Result<()> {
        match self.head()? {
            Head::Branch(name) => self.write_branch(&name, target),
            Head::Detached(_) => self.set_head_detached(target),
        }
    }
}
