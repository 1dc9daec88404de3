//! On-disk object store.
//!
//! Layout: `<root>/<id[0:2]>/<id[2:]>`, one zstd-compressed file per object.
//! New objects are written to a temporary file in `<root>` and renamed into
//! place, so a crash never leaves a truncated object under a valid id.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sit_crypto::HashingReader;
use sit_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// zstd compression level for stored objects.
const COMPRESSION_LEVEL: i32 = 3;

/// Object store backed by a directory of compressed files.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store rooted at `root` (typically `.sit/objects`).
    ///
    /// The directory is created if it does not exist.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `id`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    /// Move a finished temporary file to its final location.
    fn install(&self, tmp: NamedTempFile, id: &ObjectId) -> StoreResult<()> {
        let dst = self.object_path(id);
        if dst.exists() {
            debug!(%id, "object already present");
            return Ok(());
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        tmp.persist(&dst).map_err(|e| StoreError::Io(e.error))?;
        debug!(%id, "object written");
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let data = zstd::decode_all(compressed.as_slice()).map_err(|e| {
            StoreError::CorruptObject {
                id: *id,
                reason: format!("decompression failed: {e}"),
            }
        })?;
        Ok(Some(data))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_empty() {
            return Err(StoreError::EmptyObjectId);
        }
        if self.object_path(&id).exists() {
            debug!(%id, kind = %object.kind, "object already present");
            return Ok(id);
        }
        let compressed = zstd::encode_all(object.data.as_slice(), COMPRESSION_LEVEL)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&compressed)?;
        self.install(tmp, &id)?;
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::remove_file(self.object_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Hash and compress a working file in a single streaming pass.
    fn import_file(&self, path: &Path) -> StoreResult<ObjectId> {
        let mut reader = HashingReader::new(BufReader::new(File::open(path)?));
        let tmp = NamedTempFile::new_in(&self.root)?;
        {
            let mut encoder = zstd::Encoder::new(BufWriter::new(tmp.as_file()), COMPRESSION_LEVEL)?;
            io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
        }
        let id = reader.finish();
        self.install(tmp, &id)?;
        Ok(id)
    }

    /// Stream-decompress a blob into `dst`.
    fn export_to(&self, id: &ObjectId, dst: &Path) -> StoreResult<()> {
        let src = match File::open(self.object_path(id)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*id))
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(dst)?);
        zstd::stream::copy_decode(BufReader::new(src), &mut out).map_err(|e| {
            StoreError::CorruptObject {
                id: *id,
                reason: format!("decompression failed: {e}"),
            }
        })?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Tree, TreeEntry};

    fn temp_store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path().join("objects")).unwrap();
        (dir, store)
    }

    fn stored_files(store: &FsObjectStore) -> usize {
        fs::read_dir(store.root())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| fs::read_dir(e.path()).unwrap().count())
            .sum()
    }

    #[test]
    fn object_path_uses_two_char_fanout() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([0xab; 20]);
        let path = store.object_path(&id);
        assert!(path.ends_with(format!("ab/{}", "ab".repeat(19))));
    }

    #[test]
    fn blob_roundtrip_and_compressed_on_disk() {
        let (_dir, store) = temp_store();
        let data = vec![b'a'; 10_000];
        let id = store.write_blob(&data).unwrap();
        assert_eq!(store.read_blob(&id).unwrap(), data);
        let on_disk = fs::read(store.object_path(&id)).unwrap();
        assert!(on_disk.len() < data.len());
    }

    #[test]
    fn idempotent_write_keeps_one_file() {
        let (_dir, store) = temp_store();
        let a = store.write_blob(b"same").unwrap();
        let b = store.write_blob(b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(stored_files(&store), 1);
    }

    #[test]
    fn tree_roundtrip() {
        let (_dir, store) = temp_store();
        let blob = store.write_blob(b"content").unwrap();
        let tree = Tree::new(vec![TreeEntry::blob("file.txt", blob)]);
        let id = store.write_tree(&tree).unwrap();
        assert_eq!(store.read_tree(&id).unwrap(), tree);
    }

    #[test]
    fn import_file_matches_blob_id() {
        let (dir, store) = temp_store();
        let path = dir.path().join("work.txt");
        fs::write(&path, b"hello").unwrap();
        let id = store.import_file(&path).unwrap();
        assert_eq!(id.to_hex(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
        assert_eq!(store.read_blob(&id).unwrap(), b"hello");

        // Importing again does not add a second file or leave temporaries.
        store.import_file(&path).unwrap();
        assert_eq!(stored_files(&store), 1);
        let loose: Vec<_> = fs::read_dir(store.root())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .collect();
        assert!(loose.is_empty());
    }

    #[test]
    fn export_creates_parents() {
        let (dir, store) = temp_store();
        let id = store.write_blob(b"checked out").unwrap();
        let dst = dir.path().join("a/b/c.txt");
        store.export_to(&id, &dst).unwrap();
        assert_eq!(fs::read(dst).unwrap(), b"checked out");
    }

    #[test]
    fn export_missing_is_not_found() {
        let (dir, store) = temp_store();
        let err = store
            .export_to(&ObjectId::from_hash([1; 20]), &dir.path().join("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn garbage_on_disk_is_corrupt() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([7; 20]);
        let path = store.object_path(&id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not zstd").unwrap();
        assert!(matches!(
            store.read(&id),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn delete_removes_file() {
        let (_dir, store) = temp_store();
        let id = store.write_blob(b"bye").unwrap();
        assert!(store.exists(&id).unwrap());
        assert!(store.delete(&id).unwrap());
        assert!(!store.exists(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
    }
}
