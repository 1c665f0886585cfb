// Thu Jan 22 2026 - Alex

use crate::runtime::error::StoreError;
use crate::utils::Digest;
use ahash::AHashMap;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Reference to a value in an [`ObjectStore`]. Holding a handle never
/// materializes the value; only [`ObjectStore::get`] does.
pub struct Handle<T> {
    id: Digest,
    size: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn id(&self) -> Digest {
        self.id
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}, {} bytes)", self.id, self.size)
    }
}

/// Content-addressed, write-once value store.
///
/// Values are kept serialized; the address is the digest of the encoding, so
/// putting an equal value twice yields the same handle and stores it once.
#[derive(Clone, Default)]
pub struct ObjectStore {
    objects: Arc<RwLock<AHashMap<Digest, Bytes>>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize>(&self, value: &T) -> Result<Handle<T>, StoreError> {
        let encoded = serde_json::to_vec(value).map_err(StoreError::Encode)?;
        let id = Digest::of(&encoded);
        let size = encoded.len();

        let mut objects = self.objects.write();
        match objects.get(&id) {
            Some(existing) if existing[..] != encoded[..] => return Err(StoreError::Collision(id)),
            Some(_) => {}
            None => {
                objects.insert(id, Bytes::from(encoded));
            }
        }

        Ok(Handle {
            id,
            size,
            _marker: PhantomData,
        })
    }

    pub fn get<T: DeserializeOwned>(&self, handle: &Handle<T>) -> Result<T, StoreError> {
        let bytes = self.objects.read()
            .get(&handle.id)
            .cloned()
            .ok_or(StoreError::Missing(handle.id))?;

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            id: handle.id,
            source,
        })
    }

    /// Drop the value behind `handle`. Returns false if it was not present.
    pub fn remove<T>(&self, handle: &Handle<T>) -> bool {
        self.objects.write().remove(&handle.id).is_some()
    }

    pub fn contains<T>(&self, handle: &Handle<T>) -> bool {
        self.objects.read().contains_key(&handle.id)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.objects.read().values().map(|b| b.len()).sum()
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("objects", &self.len())
            .finish()
    }
}
