//! Shared fixtures for media integration tests.

pub mod mocks;

use std::path::Path;
use std::sync::Arc;
use tether_media::StoreRegistry;
use tether_storage::{FileSystemStore, Store};

/// Registry with a filesystem store rooted at `root` registered as default
/// under the name "fs".
#[allow(dead_code)]
pub fn fs_registry(root: &Path) -> Arc<StoreRegistry> {
    let registry = Arc::new(StoreRegistry::new());
    let root = root.to_path_buf();
    registry
        .register(
            "fs",
            Arc::new(move || Ok(Arc::new(FileSystemStore::new(root.clone())) as Arc<dyn Store>)),
            true,
        )
        .expect("register fs store");
    registry
}

/// Registry with a single pre-built store registered as default.
#[allow(dead_code)]
pub fn single_store_registry(name: &str, store: Arc<dyn Store>) -> Arc<StoreRegistry> {
    let registry = Arc::new(StoreRegistry::new());
    registry
        .register_instance(name, store, true)
        .expect("register store");
    registry
}

/// Number of regular files under `root` (non-recursive; filesystem keys are
/// flat UUID names).
#[allow(dead_code)]
pub fn file_count(root: &Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count(),
        Err(_) => 0,
    }
}
