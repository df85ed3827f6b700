//! Transactional attachment layer for tether.
//!
//! Couples file metadata living in a host record with blob content living in
//! a [`Store`](tether_storage::Store), keeping the two in sync across the host
//! transaction's commit or rollback:
//!
//! - [`Attachment`] — value object for one file's metadata, with
//!   attach/detach and change notification for the owning record.
//! - [`StoreManager`] — transaction-scoped coordinator that defers physical
//!   deletes until the transaction's outcome is known, so a rollback never
//!   leaves a record pointing at a deleted blob and a commit never leaves the
//!   superseded blob behind.
//! - [`StoreRegistry`] — process-wide name → store factory table with a
//!   single default.
//!
//! The manager is bound ambiently to the current task via
//! [`StoreManager::scope`]; attachments resolve it with
//! [`StoreManager::current`] rather than threading a handle through every
//! call, mirroring how the host transaction itself is ambient.
//!
//! Known limitation: if the host never signals commit or rollback (abrupt
//! termination), blobs written in that transaction are leaked; there is no
//! crash-recovery sweep here.

pub mod attachment;
pub mod error;
pub mod manager;
pub mod registry;

pub use attachment::{Attachment, ChangeHook};
pub use error::{MediaError, MediaResult};
pub use manager::{Phase, ReconcileFailure, ReconcileReport, StoreManager};
pub use registry::{StoreFactory, StoreRegistry};
