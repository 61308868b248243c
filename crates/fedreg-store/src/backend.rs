//! Storage backends for graph snapshots

use crate::graph::Graph;
use async_trait::async_trait;
use fedreg_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Storage backend trait
///
/// A backend persists whole graph snapshots. It is called once at start-up
/// and after every committed write transaction.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Load the last persisted graph, `None` when nothing was stored yet
    async fn load(&self) -> Result<Option<Graph>>;

    /// Persist a committed graph
    async fn persist(&self, graph: &Graph) -> Result<()>;

    /// Backend name, for logs and the status endpoint
    fn name(&self) -> &'static str;
}

/// In-memory backend
///
/// Nothing is persisted: the registry starts empty on every run.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend;

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn load(&self) -> Result<Option<Graph>> {
        Ok(None)
    }

    async fn persist(&self, _graph: &Graph) -> Result<()> {
        trace!("InMemory PERSIST (no-op)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "inmemory"
    }
}

/// JSON snapshot backend
///
/// Every commit rewrites the snapshot through a temporary file followed by a
/// rename, so a crash never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a file backend writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn load(&self) -> Result<Option<Graph>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot found, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let graph = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Storage(format!(
                "corrupted snapshot {}: {e}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), "Snapshot loaded");
        Ok(Some(graph))
    }

    async fn persist(&self, graph: &Graph) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec(graph)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        trace!(path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
