//! Mock stores for exercising failure and I/O-tracking paths.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tether_storage::{ByteStream, MemoryStore, PutReceipt, StorageError, StorageResult, Store};

/// Store whose every operation fails, counting attempted writes.
#[allow(dead_code)]
pub struct FailingStore {
    pub puts_attempted: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            puts_attempted: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn broken() -> StorageError {
        StorageError::Io(std::io::Error::other("disk on fire"))
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn put(&self, _data: Bytes, _extension: &str) -> StorageResult<PutReceipt> {
        self.puts_attempted.fetch_add(1, Ordering::SeqCst);
        Err(Self::broken())
    }

    async fn delete(&self, _key: &str) -> StorageResult<bool> {
        Err(Self::broken())
    }

    async fn open(&self, _key: &str) -> StorageResult<ByteStream> {
        Err(Self::broken())
    }

    async fn exists(&self, _key: &str) -> StorageResult<bool> {
        Err(Self::broken())
    }

    fn path_for(&self, key: &str) -> String {
        key.to_string()
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// Memory-backed store counting every I/O operation it performs.
#[allow(dead_code)]
pub struct CountingStore {
    inner: MemoryStore,
    pub ops: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            ops: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn put(&self, data: Bytes, extension: &str) -> StorageResult<PutReceipt> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.put(data, extension).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn open(&self, key: &str) -> StorageResult<ByteStream> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.open(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    fn path_for(&self, key: &str) -> String {
        self.inner.path_for(key)
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Memory-backed store whose deletes can be made to fail on demand.
#[allow(dead_code)]
pub struct FlakyDeleteStore {
    inner: MemoryStore,
    fail_deletes: AtomicBool,
}

#[allow(dead_code)]
impl FlakyDeleteStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            fail_deletes: AtomicBool::new(false),
        })
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.exists(key).await.unwrap()
    }
}

#[async_trait]
impl Store for FlakyDeleteStore {
    async fn put(&self, data: Bytes, extension: &str) -> StorageResult<PutReceipt> {
        self.inner.put(data, extension).await
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "delete rejected by test store",
            )));
        }
        self.inner.delete(key).await
    }

    async fn open(&self, key: &str) -> StorageResult<ByteStream> {
        self.inner.open(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn path_for(&self, key: &str) -> String {
        self.inner.path_for(key)
    }

    fn backend_name(&self) -> &'static str {
        "flaky-delete"
    }
}
