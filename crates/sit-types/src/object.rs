use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdError;

/// Length of an identifier in bytes.
pub const ID_LEN: usize = 20;

/// Length of an identifier rendered as hex.
pub const ID_HEX_LEN: usize = ID_LEN * 2;

/// Content-addressed identifier for any stored object.
///
/// An `ObjectId` is the SHA-1 of an object's canonical bytes. Identical
/// content always produces the same `ObjectId`, so the object store is
/// naturally deduplicated. Serialized as its 40-character hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; ID_LEN]);

impl ObjectId {
    /// The "no tree / no content" sentinel (all zeros).
    pub const EMPTY: Self = Self([0u8; ID_LEN]);

    /// Create an `ObjectId` from a pre-computed digest.
    pub const fn from_hash(hash: [u8; ID_LEN]) -> Self {
        Self(hash)
    }

    /// Returns `true` if this is the [`ObjectId::EMPTY`] sentinel.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; ID_LEN]
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 7 characters).
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(7);
        hex
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        if s.len() != ID_HEX_LEN {
            return Err(IdError::WrongLength { digits: s.len() });
        }
        let bytes = hex::decode(s).map_err(|_| IdError::NotHex { input: s.to_string() })?;
        let mut arr = [0u8; ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

impl From<[u8; ID_LEN]> for ObjectId {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_is_forty_zeros() {
        assert!(ObjectId::EMPTY.is_empty());
        assert_eq!(ObjectId::EMPTY.to_hex(), "0".repeat(40));
        assert_eq!(ObjectId::EMPTY.to_hex().len(), ID_HEX_LEN);
    }

    #[test]
    fn short_hex_is_7_chars() {
        let id = ObjectId::from_hash([0xab; ID_LEN]);
        assert_eq!(id.short_hex(), "abababa");
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ObjectId::from_hex("abcd").unwrap_err();
        assert_eq!(err, IdError::WrongLength { digits: 4 });
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "zz".repeat(20);
        assert!(matches!(
            ObjectId::from_hex(&bad),
            Err(IdError::NotHex { .. })
        ));
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = ObjectId::from_hash([1; ID_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    proptest! {
        #[test]
        fn hex_parse_inverts_display(bytes in proptest::array::uniform20(any::<u8>())) {
            let id = ObjectId::from_hash(bytes);
            prop_assert_eq!(id.to_string().parse::<ObjectId>().unwrap(), id);
        }
    }
}
