//! Attachment value object.
//!
//! An [`Attachment`] holds one stored file's metadata and lives in a field on
//! a host entity. The host persists it as a flat camelCase mapping
//! (`{key, extension, contentType, length, originalFilename?}`); an absent or
//! null mapping means "no attachment". Every field mutation fires a
//! host-supplied change hook so the owning record can be marked dirty.

use crate::error::{MediaError, MediaResult};
use crate::manager::StoreManager;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tether_storage::key::normalize_extension;

/// Host-supplied change notification callback.
pub type ChangeHook = Arc<dyn Fn() + Send + Sync>;

/// Metadata for one stored file.
///
/// Invariant: `key` is set if and only if the attachment currently denotes
/// physical content (committed or pending commit). Fields only change after a
/// successful physical write, so a failed [`attach`] leaves the attachment
/// exactly as it was.
///
/// [`attach`]: Attachment::attach
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attachment {
    key: Option<String>,
    extension: Option<String>,
    content_type: Option<String>,
    length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_filename: Option<String>,
    /// Target store name; `None` resolves the registry default.
    #[serde(skip)]
    store_name: Option<String>,
    #[serde(skip)]
    change_hook: Option<ChangeHook>,
}

impl Attachment {
    /// New empty attachment targeting the default store.
    pub fn new() -> Self {
        Self::default()
    }

    /// New empty attachment targeting a named store.
    pub fn with_store(name: impl Into<String>) -> Self {
        Self {
            store_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    /// Whether the attachment currently denotes physical content.
    pub fn is_attached(&self) -> bool {
        self.key.is_some()
    }

    /// Install the change hook. Installing the hook is not itself a mutation.
    pub fn set_change_hook(&mut self, hook: ChangeHook) {
        self.change_hook = Some(hook);
    }

    fn touch(&self) {
        if let Some(hook) = &self.change_hook {
            hook();
        }
    }

    fn set_key(&mut self, value: Option<String>) {
        self.key = value;
        self.touch();
    }

    fn set_extension(&mut self, value: Option<String>) {
        self.extension = value;
        self.touch();
    }

    fn set_content_type(&mut self, value: Option<String>) {
        self.content_type = value;
        self.touch();
    }

    fn set_length(&mut self, value: u64) {
        self.length = value;
        self.touch();
    }

    fn set_original_filename(&mut self, value: Option<String>) {
        self.original_filename = value;
        self.touch();
    }

    /// Attach new content, superseding any current content.
    ///
    /// Requires an active [`StoreManager`]. The blob is written immediately;
    /// metadata fields change only after the write succeeds, and the old/new
    /// key pair is then reported to the manager, which defers the physical
    /// delete of the old blob until commit (or deletes it at once if it was
    /// written in this same transaction).
    pub async fn attach(
        &mut self,
        data: Bytes,
        content_type: &str,
        extension: &str,
        original_filename: Option<&str>,
    ) -> MediaResult<()> {
        let manager = StoreManager::current().ok_or(MediaError::UnboundAttachment)?;
        let (store_name, store) = manager.resolve_store(self.store_name.as_deref())?;

        let receipt = store.put(data, extension).await?;

        let previous = self.key.clone();
        self.set_key(Some(receipt.key.clone()));
        self.set_extension(Some(normalize_extension(extension)));
        self.set_content_type(Some(content_type.to_string()));
        self.set_length(receipt.length);
        self.set_original_filename(original_filename.map(str::to_string));

        manager
            .register_attach(&store_name, &receipt.key, previous.as_deref())
            .await
    }

    /// Detach the current content, staging its blob for deletion on commit.
    ///
    /// Requires an active [`StoreManager`] even when there is nothing to
    /// stage. Detaching an empty attachment is a no-op.
    pub async fn detach(&mut self) -> MediaResult<()> {
        let manager = StoreManager::current().ok_or(MediaError::UnboundAttachment)?;

        if let Some(key) = self.key.clone() {
            let (store_name, _) = manager.resolve_store(self.store_name.as_deref())?;
            manager.stage_delete(&store_name, &key).await?;

            self.set_key(None);
            self.set_extension(None);
            self.set_content_type(None);
            self.set_length(0);
            self.set_original_filename(None);
        }
        Ok(())
    }

    /// Logical path of the content within its store. Pure derivation; fails
    /// with [`MediaError::NoContent`] when no content is attached.
    pub fn path(&self) -> MediaResult<String> {
        let key = self.key.as_deref().ok_or(MediaError::NoContent)?;
        let manager = StoreManager::current().ok_or(MediaError::UnboundAttachment)?;
        let (_, store) = manager.resolve_store(self.store_name.as_deref())?;
        Ok(store.path_for(key))
    }

    /// Local filename of the content, for backends that store blobs as files.
    pub fn filename(&self) -> MediaResult<PathBuf> {
        let key = self.key.as_deref().ok_or(MediaError::NoContent)?;
        let manager = StoreManager::current().ok_or(MediaError::UnboundAttachment)?;
        let (store_name, store) = manager.resolve_store(self.store_name.as_deref())?;
        store
            .locate(key)
            .ok_or(MediaError::NoLocalPath(store_name))
    }
}

/// Structural equality over exactly the persisted identity:
/// `{content_type, key, extension, length}`.
impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        self.content_type == other.content_type
            && self.key == other.key
            && self.extension == other.extension
            && self.length == other.length
    }
}

impl Eq for Attachment {}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("key", &self.key)
            .field("extension", &self.extension)
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .field("original_filename", &self.original_filename)
            .field("store_name", &self.store_name)
            .finish()
    }
}
