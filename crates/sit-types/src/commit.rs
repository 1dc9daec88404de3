use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdError;
use crate::object::{ObjectId, ID_LEN};

/// Identifier of a commit record.
///
/// Unlike an [`ObjectId`], a `CommitId` is *allocated*, not derived from the
/// record's bytes: it must stay stable when an amend rewrites the payload.
/// It shares the 40-hex textual form so prefixes and sentinels look alike.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId([u8; ID_LEN]);

impl CommitId {
    /// The "no parent" sentinel (all zeros). Its tree is [`ObjectId::EMPTY`].
    pub const EMPTY: Self = Self([0u8; ID_LEN]);

    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; ID_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 7 characters).
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(7);
        hex
    }

    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        ObjectId::from_hex(s).map(|id| Self(*id.as_bytes()))
    }
}

impl fmt::Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitId({})", self.short_hex())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for CommitId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for CommitId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_object_sentinel_text() {
        assert!(CommitId::EMPTY.is_empty());
        assert_eq!(CommitId::EMPTY.to_hex(), ObjectId::EMPTY.to_hex());
    }

    #[test]
    fn hex_roundtrip() {
        let id = CommitId::from_bytes([0x5a; ID_LEN]);
        assert_eq!(CommitId::from_hex(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn debug_is_short() {
        let id = CommitId::from_bytes([0x12; ID_LEN]);
        assert_eq!(format!("{id:?}"), "CommitId(1212121)");
    }
}
