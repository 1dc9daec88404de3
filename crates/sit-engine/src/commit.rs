//! Commit and amend.

use std::fs;
use std::io;

use chrono::Local;
use sit_dag::Commit;
use sit_index::write_index;
use sit_refs::RefStore;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::repository::Repository;

/// Timestamp layout in author and committer lines.
const STAMP_FORMAT: &str = "%Y-%b-%d %H:%M:%S";

/// Clean a commit-message buffer.
///
/// Lines are trimmed, `#` lines dropped, leading and trailing blank lines
/// removed. The result ends with a newline unless it is empty.
pub fn clean_message(text: &str) -> String {
    let mut out = String::new();
    let mut pending_blank = false;
    for line in text.lines().map(str::trim) {
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// `name <email> 2026-Oct-15 09:30:00`, in local time.
fn signature(name: &str, email: &str) -> String {
    format!("{name} <{email}> {}", Local::now().format(STAMP_FORMAT))
}

impl Repository {
    /// Record the index as a new commit on the current branch, or rewrite
    /// HEAD's commit in place with `amend`.
    ///
    /// Without `message`, the `.sit/COMMIT_MSG` buffer is used. A new commit
    /// is written before its parent's successor list is extended, and the
    /// branch moves last. Amend keeps the commit id and does not move refs.
    pub fn commit(&mut self, message: Option<&str>, amend: bool) -> EngineResult<Commit> {
        let branch = self.refs.current_branch()?;
        if branch.is_none() && !amend {
            return Err(EngineError::DetachedHead);
        }
        let head = self.refs.resolve_head()?;
        if amend && head.is_empty() {
            return Err(EngineError::AmendRoot);
        }

        let message = match message {
            Some(text) => clean_message(text),
            None => match fs::read_to_string(self.commit_msg_path()) {
                Ok(text) => clean_message(&text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(e.into()),
            },
        };
        if message.is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let name = self.config().require("user.name")?;
        let email = self.config().require("user.email")?;
        let stamp = signature(&name, &email);

        let tree = write_index(&self.store, &self.index)?;

        let commit = if amend {
            let mut commit = self.graph.read(&head)?;
            commit.tree = tree;
            commit.message = message;
            commit.author = stamp.clone();
            commit.committer = stamp;
            self.graph.write(&commit)?;
            info!(id = %commit.id.short_hex(), tree = %tree.short_hex(), "commit amended");
            commit
        } else {
            let commit = Commit {
                id: self.graph.allocate_id()?,
                tree,
                author: stamp.clone(),
                committer: stamp,
                message,
                pred: vec![head],
                succ: Vec::new(),
            };
            self.graph.create(&commit)?;
            if let Some(branch) = &branch {
                self.refs.write_branch(branch, &commit.id)?;
            }
            commit
        };
        Ok(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_cleanup() {
        let raw = "\n  # comment\n  subject  \n\n\n body line\n# trailing\n\n";
        assert_eq!(clean_message(raw), "subject\n\nbody line\n");
        assert_eq!(clean_message("# only comments\n\n"), "");
        assert_eq!(clean_message("one"), "one\n");
    }

    #[test]
    fn signature_shape() {
        let sig = signature("Ada", "ada@example.com");
        let stamp = sig.strip_prefix("Ada <ada@example.com> ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).is_ok(), "{stamp}");
    }
}
