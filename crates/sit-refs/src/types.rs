//! Core reference types.

use serde::{Deserialize, Serialize};
use sit_types::CommitId;

/// Prefix of a symbolic HEAD file.
pub const SYMBOLIC_PREFIX: &str = "ref: ";

/// Namespace for branch refs.
pub const HEADS_PREFIX: &str = "refs/heads/";

/// The state of HEAD: either symbolic (pointing to a branch) or detached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Head {
    /// HEAD points to a branch by name.
    Branch(String),
    /// HEAD is detached, pointing directly to a commit.
    Detached(CommitId),
}

impl Head {
    /// The HEAD file contents, without trailing newline.
    pub fn encode(&self) -> String {
        match self {
            Self::Branch(name) => format!("{SYMBOLIC_PREFIX}{HEADS_PREFIX}{name}"),
            Self::Detached(id) => id.to_hex(),
        }
    }

    /// Parse HEAD file contents.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.strip_prefix(SYMBOLIC_PREFIX) {
            Some(target) => target
                .trim()
                .strip_prefix(HEADS_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| Self::Branch(name.to_string())),
            None => CommitId::from_hex(text).ok().map(Self::Detached),
        }
    }

    /// The branch name, if HEAD is symbolic.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::Branch(name) => Some(name),
            Self::Detached(_) => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }
}
