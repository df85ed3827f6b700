//! Transaction-scoped store manager.
//!
//! A [`StoreManager`] lives for exactly one host transaction. Attachments
//! write blobs immediately but report the superseded key here, and the manager
//! defers the physical delete until the transaction's outcome is known:
//!
//! - commit executes the deferred deletes (the old blobs are now unreachable),
//! - rollback deletes this transaction's own writes instead, leaving the
//!   previously committed blobs as the still-current content.
//!
//! A key written and superseded within the same transaction is deleted on the
//! spot: nothing outside the transaction could ever have observed it, so there
//! is no outcome to wait for.

use crate::error::{MediaError, MediaResult};
use crate::registry::StoreRegistry;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tether_storage::Store;
use tracing::{debug, warn};

tokio::task_local! {
    static ACTIVE_MANAGER: Arc<StoreManager>;
}

/// Transaction phase. `Open` transitions once, to either terminal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Open,
    Committed,
    RolledBack,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

/// Keys staged for reconciliation in one store.
#[derive(Default)]
struct Staging {
    pending_add: HashSet<String>,
    pending_delete: HashSet<String>,
}

struct Inner {
    phase: Phase,
    /// Stores resolved during this transaction, so reconcile-time deletes go
    /// through the same instances the writes did.
    stores: HashMap<String, Arc<dyn Store>>,
    staging: HashMap<String, Staging>,
}

impl Inner {
    fn ensure_open(&self) -> MediaResult<()> {
        match self.phase {
            Phase::Open => Ok(()),
            _ => Err(MediaError::ManagerFinalized),
        }
    }
}

/// A delete that failed during commit/rollback reconciliation.
///
/// Physical cleanup is advisory: failures are reported, never escalated into
/// failing the host's metadata commit.
#[derive(Debug)]
pub struct ReconcileFailure {
    pub store: String,
    pub key: String,
    pub error: MediaError,
}

/// Outcome of a commit or rollback reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Number of blobs deleted.
    pub deleted: u64,
    /// Deletes that failed; the corresponding blobs are left behind.
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Transaction-scoped coordinator reconciling blob writes and deletes with the
/// host transaction's outcome.
///
/// One manager per transaction, bound to the current task with [`scope`]
/// (innermost binding wins, restored on exit). A manager is not meant to be
/// mutated from concurrent tasks; a multi-task host binds one manager per task.
///
/// [`scope`]: StoreManager::scope
pub struct StoreManager {
    registry: &'static StoreRegistry,
    explicit_registry: Option<Arc<StoreRegistry>>,
    inner: Mutex<Inner>,
}

impl StoreManager {
    /// Create a manager resolving stores through the process-wide registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registry: StoreRegistry::global(),
            explicit_registry: None,
            inner: Mutex::new(Inner {
                phase: Phase::Open,
                stores: HashMap::new(),
                staging: HashMap::new(),
            }),
        })
    }

    /// Create a manager bound to an explicit registry instance.
    pub fn with_registry(registry: Arc<StoreRegistry>) -> Arc<Self> {
        Arc::new(Self {
            registry: StoreRegistry::global(),
            explicit_registry: Some(registry),
            inner: Mutex::new(Inner {
                phase: Phase::Open,
                stores: HashMap::new(),
                staging: HashMap::new(),
            }),
        })
    }

    fn registry(&self) -> &StoreRegistry {
        match &self.explicit_registry {
            Some(registry) => registry,
            None => self.registry,
        }
    }

    /// Run a future with this manager bound as the task's active manager.
    ///
    /// Bindings nest: an inner scope shadows the outer manager and the outer
    /// binding is restored when the inner future completes, on every exit path.
    pub async fn scope<F>(self: Arc<Self>, fut: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_MANAGER.scope(self, fut).await
    }

    /// The innermost manager bound to the current task, if any.
    pub fn current() -> Option<Arc<StoreManager>> {
        ACTIVE_MANAGER.try_with(Arc::clone).ok()
    }

    /// Current transaction phase.
    pub fn phase(&self) -> Phase {
        self.inner.lock().expect("lock poisoned").phase
    }

    /// Resolve a store by name (or the registry default), caching the instance
    /// for the lifetime of this manager.
    pub fn resolve_store(&self, name: Option<&str>) -> MediaResult<(String, Arc<dyn Store>)> {
        let canonical = match name {
            Some(name) => name.to_string(),
            None => self
                .registry()
                .default_name()
                .ok_or(MediaError::NoDefaultStore)?,
        };

        {
            let inner = self.inner.lock().expect("lock poisoned");
            if let Some(store) = inner.stores.get(&canonical) {
                return Ok((canonical, store.clone()));
            }
        }

        let (resolved, store) = self.registry().resolve(Some(&canonical))?;
        let mut inner = self.inner.lock().expect("lock poisoned");
        let store = inner
            .stores
            .entry(resolved.clone())
            .or_insert(store)
            .clone();
        Ok((resolved, store))
    }

    /// Record a successful physical write.
    ///
    /// `new_key` becomes pending-add. If `old_key` was written earlier in this
    /// same transaction it is unstaged and deleted immediately; otherwise it is
    /// committed content and goes to pending-delete, surviving a rollback.
    pub async fn register_attach(
        &self,
        store_name: &str,
        new_key: &str,
        old_key: Option<&str>,
    ) -> MediaResult<()> {
        let immediate = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.ensure_open()?;
            let staging = inner.staging.entry(store_name.to_string()).or_default();
            staging.pending_add.insert(new_key.to_string());
            match old_key {
                Some(old) => {
                    if staging.pending_add.remove(old) {
                        Some(old.to_string())
                    } else {
                        staging.pending_delete.insert(old.to_string());
                        None
                    }
                }
                None => None,
            }
        };

        if let Some(old) = immediate {
            self.delete_superseded(store_name, &old).await;
        }
        Ok(())
    }

    /// Stage a key for deletion with no replacement (detach path).
    ///
    /// Same short-circuit as [`register_attach`]: a key written in this
    /// transaction is deleted on the spot instead of being staged.
    ///
    /// [`register_attach`]: StoreManager::register_attach
    pub async fn stage_delete(&self, store_name: &str, key: &str) -> MediaResult<()> {
        let immediate = {
            let mut inner = self.inner.lock().expect("lock poisoned");
            inner.ensure_open()?;
            let staging = inner.staging.entry(store_name.to_string()).or_default();
            if staging.pending_add.remove(key) {
                true
            } else {
                staging.pending_delete.insert(key.to_string());
                false
            }
        };

        if immediate {
            self.delete_superseded(store_name, key).await;
        }
        Ok(())
    }

    /// The host transaction committed: execute the deferred deletes.
    ///
    /// Deletes are best-effort; failures land in the report and are logged,
    /// but the commit itself has already happened and is never unwound here.
    pub async fn commit(&self) -> MediaResult<ReconcileReport> {
        let staging = self.finalize(Phase::Committed)?;
        Ok(self.reconcile(staging, |staged| staged.pending_delete).await)
    }

    /// The host transaction rolled back: delete this transaction's writes.
    ///
    /// Pending deletes are left untouched; those keys are still the current
    /// committed content.
    pub async fn rollback(&self) -> MediaResult<ReconcileReport> {
        let staging = self.finalize(Phase::RolledBack)?;
        Ok(self.reconcile(staging, |staged| staged.pending_add).await)
    }

    fn finalize(&self, phase: Phase) -> MediaResult<HashMap<String, Staging>> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        inner.ensure_open()?;
        inner.phase = phase;
        debug!(phase = phase.as_str(), "store manager finalized");
        Ok(std::mem::take(&mut inner.staging))
    }

    async fn reconcile(
        &self,
        staging: HashMap<String, Staging>,
        doomed: impl Fn(Staging) -> HashSet<String>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for (store_name, staged) in staging {
            let store = match self.resolve_store(Some(&store_name)) {
                Ok((_, store)) => store,
                Err(error) => {
                    // The store vanished from the registry mid-transaction;
                    // report every doomed key as failed.
                    warn!(store = %store_name, %error, "store unresolvable during reconciliation");
                    report
                        .failures
                        .extend(doomed(staged).into_iter().map(|key| ReconcileFailure {
                            store: store_name.clone(),
                            key,
                            error: MediaError::StoreNotFound(store_name.clone()),
                        }));
                    continue;
                }
            };

            for key in doomed(staged) {
                match store.delete(&key).await {
                    Ok(_) => report.deleted += 1,
                    Err(error) => {
                        warn!(store = %store_name, %key, %error, "reconcile delete failed");
                        report.failures.push(ReconcileFailure {
                            store: store_name.clone(),
                            key,
                            error: error.into(),
                        });
                    }
                }
            }
        }
        report
    }

    /// Delete a key superseded within the open transaction. Best-effort: the
    /// blob was never visible outside this transaction, so a failure only
    /// leaks an orphan.
    async fn delete_superseded(&self, store_name: &str, key: &str) {
        match self.resolve_store(Some(store_name)) {
            Ok((_, store)) => {
                if let Err(error) = store.delete(key).await {
                    warn!(store = %store_name, %key, %error, "superseded blob delete failed");
                }
            }
            Err(error) => {
                warn!(store = %store_name, %key, %error, "store unresolvable for superseded delete");
            }
        }
    }
}

impl Drop for StoreManager {
    fn drop(&mut self) {
        // A manager dropped while open never learned its transaction's
        // outcome; its staged adds are leaked (documented limitation).
        if let Ok(inner) = self.inner.lock() {
            if inner.phase == Phase::Open {
                let leaked: usize = inner
                    .staging
                    .values()
                    .map(|staged| staged.pending_add.len())
                    .sum();
                if leaked > 0 {
                    warn!(leaked, "store manager dropped while open; staged blobs leaked");
                }
            }
        }
    }
}
