use serde::{Deserialize, Serialize};
use sit_crypto::ContentHasher;
use sit_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// What an object's bytes are: file content or a directory listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Blob,
    /// Sorted `mode kind id name` lines.
    Tree,
}

impl ObjectKind {
    /// The keyword used for this kind in tree bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
        }
    }

    /// Parse the keyword used in tree bodies.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + canonical bytes + cached size.
///
/// The kind is not persisted: on disk an object is only its compressed bytes,
/// and the reader decides how to interpret them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Raw file content.
    pub fn blob(data: Vec<u8>) -> Self {
        Self::new(ObjectKind::Blob, data)
    }

    /// The SHA-1 of the stored bytes.
    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::hash(&self.data)
    }
}

/// Mode of a tree entry, written as six octal digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
}

impl EntryMode {
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            _ => None,
        }
    }

    /// The object kind an entry with this mode must reference.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Directory => ObjectKind::Tree,
            _ => ObjectKind::Blob,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// One child of a directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub kind: ObjectKind,
    pub object_id: ObjectId,
    /// A single path segment (no `/`).
    pub name: String,
}

impl TreeEntry {
    /// A regular-file entry referencing a blob.
    pub fn blob(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode: EntryMode::Regular,
            kind: ObjectKind::Blob,
            object_id,
            name: name.into(),
        }
    }

    /// A directory entry referencing a subtree.
    pub fn tree(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode: EntryMode::Directory,
            kind: ObjectKind::Tree,
            object_id,
            name: name.into(),
        }
    }

    /// Serialize as `<6-digit octal mode> <kind> <40-hex id> <name>`.
    fn encode_line(&self, out: &mut Vec<u8>) {
        let line = format!("{} {} {} {}\n", self.mode, self.kind, self.object_id, self.name);
        out.extend_from_slice(line.as_bytes());
    }

    fn decode_line(tree_id: &ObjectId, line: &str) -> StoreResult<Self> {
        let corrupt = |reason: String| StoreError::CorruptObject {
            id: *tree_id,
            reason,
        };

        let mut parts = line.splitn(4, ' ');
        let (Some(mode), Some(kind), Some(id), Some(name)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(corrupt(format!("malformed tree line: {line:?}")));
        };

        if mode.len() != 6 {
            return Err(corrupt(format!("mode must be 6 octal digits: {mode:?}")));
        }
        let mode = u32::from_str_radix(mode, 8)
            .ok()
            .and_then(EntryMode::from_mode_bits)
            .ok_or_else(|| corrupt(format!("unknown mode: {mode:?}")))?;
        let kind =
            ObjectKind::parse(kind).ok_or_else(|| corrupt(format!("unknown kind: {kind:?}")))?;
        if mode.object_kind() != kind {
            return Err(corrupt(format!("mode {mode} does not match kind {kind}")));
        }
        let object_id =
            ObjectId::from_hex(id).map_err(|e| corrupt(format!("bad entry id: {e}")))?;
        if name.is_empty() || name.contains('/') {
            return Err(corrupt(format!("invalid entry name: {name:?}")));
        }

        Ok(Self {
            mode,
            kind,
            object_id,
            name: name.to_string(),
        })
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// One directory level of a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Entries are sorted by name so the encoded bytes, and therefore the id,
    /// depend only on the set of children.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The canonical body: one line per entry.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 64);
        for entry in &self.entries {
            entry.encode_line(&mut out);
        }
        out
    }

    /// Parse a tree body. `id` is only used to label errors.
    pub fn decode(id: &ObjectId, data: &[u8]) -> StoreResult<Self> {
        let text = std::str::from_utf8(data).map_err(|e| StoreError::CorruptObject {
            id: *id,
            reason: format!("tree body is not UTF-8: {e}"),
        })?;
        let entries = text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| TreeEntry::decode_line(id, line))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Tree, self.encode())
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 20])
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::blob("zebra.txt", oid(1)),
            TreeEntry::blob("alpha.txt", oid(2)),
            TreeEntry::tree("middle", oid(3)),
        ]);
        assert_eq!(tree.entries[0].name, "alpha.txt");
        assert_eq!(tree.entries[1].name, "middle");
        assert_eq!(tree.entries[2].name, "zebra.txt");
    }

    #[test]
    fn encoded_line_grammar() {
        let tree = Tree::new(vec![
            TreeEntry::blob("a.txt", oid(0xaa)),
            TreeEntry::tree("dir", oid(0xbb)),
        ]);
        let body = String::from_utf8(tree.encode()).unwrap();
        let expected = format!(
            "100644 blob {} a.txt\n040000 tree {} dir\n",
            "aa".repeat(20),
            "bb".repeat(20)
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn decode_reproduces_entries() {
        let tree = Tree::new(vec![
            TreeEntry::blob("file with spaces.txt", oid(1)),
            TreeEntry::tree("sub", oid(2)),
        ]);
        let id = tree.to_stored_object().compute_id();
        let decoded = Tree::decode(&id, &tree.encode()).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn decode_empty_body() {
        let tree = Tree::decode(&oid(0), b"").unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn decode_rejects_unknown_mode() {
        let line = format!("100600 blob {} x\n", "11".repeat(20));
        let err = Tree::decode(&oid(9), line.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn decode_rejects_kind_mismatch() {
        let line = format!("040000 blob {} x\n", "11".repeat(20));
        assert!(Tree::decode(&oid(9), line.as_bytes()).is_err());
    }

    #[test]
    fn decode_rejects_truncated_line() {
        assert!(Tree::decode(&oid(9), b"100644 blob\n").is_err());
    }

    #[test]
    fn same_children_same_id_regardless_of_order() {
        let a = Tree::new(vec![TreeEntry::blob("x", oid(1)), TreeEntry::blob("y", oid(2))]);
        let b = Tree::new(vec![TreeEntry::blob("y", oid(2)), TreeEntry::blob("x", oid(1))]);
        assert_eq!(
            a.to_stored_object().compute_id(),
            b.to_stored_object().compute_id()
        );
    }

    #[test]
    fn entry_mode_bits_roundtrip() {
        for mode in [
            EntryMode::Regular,
            EntryMode::Executable,
            EntryMode::Symlink,
            EntryMode::Directory,
        ] {
            assert_eq!(EntryMode::from_mode_bits(mode.mode_bits()), Some(mode));
        }
        assert_eq!(EntryMode::Directory.to_string(), "040000");
    }

    #[test]
    fn blob_id_is_sha1_of_payload() {
        let stored = StoredObject::blob(b"hello".to_vec());
        assert_eq!(
            stored.compute_id().to_hex(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(stored.size, 5);
    }

    proptest::proptest! {
        #[test]
        fn tree_id_ignores_insertion_order(
            names in proptest::collection::btree_set("[a-zA-Z0-9._ -]{1,12}", 1..8),
        ) {
            let entries: Vec<_> = names
                .iter()
                .enumerate()
                .map(|(i, n)| TreeEntry::blob(n.clone(), oid(i as u8 + 1)))
                .collect();
            let mut reversed = entries.clone();
            reversed.reverse();
            let a = Tree::new(entries);
            let b = Tree::new(reversed);
            proptest::prop_assert_eq!(a.encode(), b.encode());
            let decoded = Tree::decode(&oid(0), &a.encode()).unwrap();
            proptest::prop_assert_eq!(decoded, a);
        }
    }
}
