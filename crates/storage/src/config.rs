//! Storage backend configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for blobs, created on first write if missing.
        path: PathBuf,
    },
    /// In-memory storage (tests and embedding).
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/blobs"),
        }
    }
}

impl StoreConfig {
    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StoreConfig::Filesystem { path } => {
                if path.as_os_str().is_empty() {
                    return Err("filesystem config requires a non-empty path".to_string());
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }
}
