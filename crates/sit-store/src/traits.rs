use std::fs;
use std::path::Path;

use sit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{StoredObject, Tree};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same bytes always produce the
///   same ID, so writing an existing object is a no-op.
/// - The store never interprets object contents; typed access goes through
///   the provided `read_blob` / `read_tree` helpers.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object's decompressed bytes by ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Delete an object by ID. Returns `true` if the object existed.
    ///
    /// Deleting a referenced object corrupts every tree or commit pointing
    /// at it; nothing on the commit path calls this.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Store the contents of a working file as a blob.
    ///
    /// The default buffers the whole file; disk-backed stores stream it.
    fn import_file(&self, path: &Path) -> StoreResult<ObjectId> {
        let data = fs::read(path)?;
        self.write(&StoredObject::blob(data))
    }

    /// Write a blob's contents to `dst`, creating parent directories.
    ///
    /// The default buffers the whole blob; disk-backed stores stream it.
    fn export_to(&self, id: &ObjectId, dst: &Path) -> StoreResult<()> {
        let data = self.read(id)?.ok_or(StoreError::NotFound(*id))?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dst, data)?;
        Ok(())
    }

    /// Store raw bytes as a blob.
    fn write_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.write(&StoredObject::blob(data.to_vec()))
    }

    /// Serialize and store a tree.
    fn write_tree(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object())
    }

    /// Read a blob's bytes, failing if it is missing.
    fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Read and parse a tree, failing if it is missing or malformed.
    fn read_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        let data = self.read(id)?.ok_or(StoreError::NotFound(*id))?;
        Tree::decode(id, &data)
    }
}
