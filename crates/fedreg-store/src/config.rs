//! Configuration for storage backends

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend type
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Backend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-memory backend (default, nothing survives a restart)
    #[default]
    InMemory,

    /// JSON snapshot on the local filesystem
    File {
        /// Snapshot path
        path: PathBuf,
    },
}
