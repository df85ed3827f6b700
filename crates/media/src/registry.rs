//! Process-wide store registry.
//!
//! Maps store names to factories, with at most one entry flagged as the
//! default. The registry is populated once at process start and treated as
//! read-only afterwards; managers resolve stores through it on demand.

use crate::error::{MediaError, MediaResult};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tether_storage::{StorageResult, Store};

/// Factory producing a store instance. Factories must be cheap and perform no
/// I/O; backends defer filesystem work to the first write.
pub type StoreFactory = Arc<dyn Fn() -> StorageResult<Arc<dyn Store>> + Send + Sync>;

#[derive(Default)]
struct Inner {
    factories: HashMap<String, StoreFactory>,
    default: Option<String>,
}

/// Name-keyed store lookup table.
///
/// A single process-wide instance is available through [`StoreRegistry::global`];
/// tests bind managers to their own instances instead.
#[derive(Default)]
pub struct StoreRegistry {
    inner: RwLock<Inner>,
}

static GLOBAL: OnceLock<StoreRegistry> = OnceLock::new();

impl StoreRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static StoreRegistry {
        GLOBAL.get_or_init(StoreRegistry::new)
    }

    /// Register a store factory under a unique name.
    ///
    /// Fails on duplicate names, and on a second `default` flag.
    pub fn register(&self, name: &str, factory: StoreFactory, default: bool) -> MediaResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.factories.contains_key(name) {
            return Err(MediaError::DuplicateStore(name.to_string()));
        }
        if default {
            if let Some(existing) = &inner.default {
                return Err(MediaError::DuplicateDefault(existing.clone()));
            }
            inner.default = Some(name.to_string());
        }
        inner.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Register an already-constructed store; the factory hands out clones of
    /// the same instance.
    pub fn register_instance(
        &self,
        name: &str,
        store: Arc<dyn Store>,
        default: bool,
    ) -> MediaResult<()> {
        self.register(name, Arc::new(move || Ok(store.clone())), default)
    }

    /// Name of the default store, if one is flagged.
    pub fn default_name(&self) -> Option<String> {
        self.inner.read().expect("lock poisoned").default.clone()
    }

    /// Resolve a store by name, or the default when no name is given.
    ///
    /// Returns the canonical store name alongside the instance so callers can
    /// key staging records by it.
    pub fn resolve(&self, name: Option<&str>) -> MediaResult<(String, Arc<dyn Store>)> {
        let inner = self.inner.read().expect("lock poisoned");
        let name = match name {
            Some(name) => name.to_string(),
            None => inner.default.clone().ok_or(MediaError::NoDefaultStore)?,
        };
        let factory = inner
            .factories
            .get(&name)
            .ok_or_else(|| MediaError::StoreNotFound(name.clone()))?;
        let store = factory()?;
        Ok((name, store))
    }
}
