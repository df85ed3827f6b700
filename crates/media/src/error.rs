//! Media layer error types.

use tether_storage::StorageError;
use thiserror::Error;

/// Errors raised by attachments, the store registry, and store managers.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Attach/detach was called with no active store manager in scope.
    /// Raised before any I/O is performed.
    #[error("attachment is not bound to an active store manager")]
    UnboundAttachment,

    #[error("store not registered: {0}")]
    StoreNotFound(String),

    #[error("no default store is registered")]
    NoDefaultStore,

    #[error("store already registered: {0}")]
    DuplicateStore(String),

    #[error("a default store is already registered: {0}")]
    DuplicateDefault(String),

    /// The manager has already committed or rolled back.
    #[error("store manager is already finalized")]
    ManagerFinalized,

    /// The attachment has no key, so there is no content to derive from.
    #[error("attachment has no content")]
    NoContent,

    #[error("store '{0}' does not expose local filenames")]
    NoLocalPath(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for media operations.
pub type MediaResult<T> = std::result::Result<T, MediaError>;
