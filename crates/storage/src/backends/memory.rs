//! In-memory storage backend.

use crate::error::{StorageError, StorageResult};
use crate::key;
use crate::traits::{ByteStream, PutReceipt, Store};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind an `RwLock`;
/// `Bytes` payloads are cheap to clone on read.
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Return a sorted list of all keys in the store.
    pub fn all_keys(&self) -> Vec<String> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put(&self, data: Bytes, extension: &str) -> StorageResult<PutReceipt> {
        let new_key = key::generate(extension);
        let length = data.len() as u64;
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(new_key.clone(), data);
        Ok(PutReceipt {
            key: new_key,
            length,
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    async fn open(&self, key: &str) -> StorageResult<ByteStream> {
        let map = self.blobs.read().expect("lock poisoned");
        let data = map
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn path_for(&self, key: &str) -> String {
        key.to_string()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
