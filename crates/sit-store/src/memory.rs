use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Object store held in a map, for tests. Bodies are kept uncompressed.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<ObjectId, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> RwLockReadGuard<'_, BTreeMap<ObjectId, Vec<u8>>> {
        self.objects.read().expect("lock poisoned")
    }

    fn objects_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<ObjectId, Vec<u8>>> {
        self.objects.write().expect("lock poisoned")
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// Sum of all stored body sizes.
    pub fn total_bytes(&self) -> u64 {
        self.objects().values().map(|body| body.len() as u64).sum()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.objects().get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_empty() {
            return Err(StoreError::EmptyObjectId);
        }
        self.objects_mut()
            .entry(id)
            .or_insert_with(|| object.data.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects().contains_key(id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects_mut().remove(id).is_some())
    }
}
