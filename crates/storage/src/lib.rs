//! Blob store abstraction and backends for tether.
//!
//! This crate provides:
//! - The [`Store`] trait: durable `put`, idempotent `delete`, streaming `open`
//! - Collision-resistant key generation ([`key`])
//! - Backends: local filesystem and in-memory
//!
//! Stores generate their own keys: every `put` produces a fresh key, so
//! existing blobs are never overwritten and identical payloads are never
//! deduplicated. Superseding content is always write-new-then-delete-old,
//! which is what lets the transaction layer in `tether-media` defer the
//! delete until the host transaction's outcome is known.

pub mod backends;
pub mod config;
pub mod error;
pub mod key;
pub mod traits;

pub use backends::{filesystem::FileSystemStore, memory::MemoryStore};
pub use config::StoreConfig;
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, PutReceipt, Store};

use std::sync::Arc;

/// Create a store from configuration.
pub fn from_config(config: &StoreConfig) -> StorageResult<Arc<dyn Store>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StoreConfig::Filesystem { path } => Ok(Arc::new(FileSystemStore::new(path))),
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
