//! Store trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::PathBuf;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Outcome of a successful write: the freshly generated key and the number of
/// bytes made durable under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutReceipt {
    pub key: String,
    pub length: u64,
}

/// Blob store abstraction.
///
/// A store persists opaque blobs under keys it generates itself. Keys are
/// never reused and never overwritten; superseding content means writing a new
/// key and deleting the old one.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Write a blob durably and return its fresh key.
    ///
    /// The data is fully persisted before this returns; a caller observing a
    /// successful `put` may rely on the blob existing under the returned key.
    async fn put(&self, data: Bytes, extension: &str) -> StorageResult<PutReceipt>;

    /// Delete a blob. Idempotent: returns `false` (not an error) when the key
    /// is absent.
    async fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Open a blob for reading. Fails with `NotFound` if the key is absent.
    async fn open(&self, key: &str) -> StorageResult<ByteStream>;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Logical path of a key within this store. Pure, no I/O.
    fn path_for(&self, key: &str) -> String;

    /// Local filename for a key, if this backend stores blobs as files.
    fn locate(&self, key: &str) -> Option<PathBuf> {
        let _ = key;
        None
    }

    /// Static identifier for the backend type, used for logging.
    fn backend_name(&self) -> &'static str;
}
