//! Transactional access to the registry graph

use crate::backend::{FileBackend, InMemoryBackend, StorageBackend};
use crate::config::{BackendConfig, StorageConfig};
use crate::graph::Graph;
use fedreg_core::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Registry database
///
/// Readers see the last committed graph. Writers are serialized: each write
/// transaction runs on a private copy of the graph which replaces the committed
/// one only after the closure succeeded and the backend persisted it. A failed
/// transaction leaves no trace.
#[derive(Debug)]
pub struct Database {
    graph: RwLock<Arc<Graph>>,
    writer: Mutex<()>,
    backend: Arc<dyn StorageBackend>,
}

impl Database {
    /// Create a database over an explicit backend and initial graph
    pub fn new(backend: Arc<dyn StorageBackend>, graph: Graph) -> Self {
        Self {
            graph: RwLock::new(Arc::new(graph)),
            writer: Mutex::new(()),
            backend,
        }
    }

    /// Create an empty in-memory database
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), Graph::new())
    }

    /// Open the database described by the storage configuration, loading the
    /// last snapshot when the backend has one.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let backend: Arc<dyn StorageBackend> = match &config.backend {
            BackendConfig::InMemory => Arc::new(InMemoryBackend::new()),
            BackendConfig::File { path } => Arc::new(FileBackend::new(path)),
        };

        let graph = backend.load().await?.unwrap_or_default();
        info!(
            backend = backend.name(),
            providers = graph.providers.len(),
            "Database opened"
        );
        Ok(Self::new(backend, graph))
    }

    /// Backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Run `f` against the last committed graph
    pub fn read_transaction<T>(&self, f: impl FnOnce(&Graph) -> Result<T>) -> Result<T> {
        let snapshot = Arc::clone(&self.graph.read());
        f(&snapshot)
    }

    /// Run `f` against a private copy of the graph and commit it on success
    pub async fn write_transaction<T>(
        &self,
        f: impl FnOnce(&mut Graph) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.writer.lock().await;

        let mut draft = Graph::clone(&self.graph.read());
        let output = match f(&mut draft) {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "Write transaction rolled back");
                return Err(e);
            }
        };

        self.backend.persist(&draft).await?;
        *self.graph.write() = Arc::new(draft);
        debug!("Write transaction committed");
        Ok(output)
    }

    /// Node count per kind in the committed graph
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.graph.read().counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedreg_core::{Error, Project};

    fn project(uid: &str) -> Project {
        Project {
            uid: uid.to_string(),
            description: String::new(),
            name: "proj".to_string(),
            uuid: uid.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_transaction_commits() {
        let db = Database::in_memory();
        db.write_transaction(|g| {
            g.insert(project("u1"));
            Ok(())
        })
        .await
        .unwrap();

        let found = db
            .read_transaction(|g| Ok(g.projects.contains("u1")))
            .unwrap();
        assert!(found);
        assert_eq!(db.counts()["projects"], 1);
    }

    #[tokio::test]
    async fn test_failed_write_transaction_rolls_back() {
        let db = Database::in_memory();
        let result: Result<()> = db
            .write_transaction(|g| {
                g.insert(project("u1"));
                Err(Error::bad_request("conflict"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(db.counts()["projects"], 0);
    }

    #[tokio::test]
    async fn test_open_file_backend_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: BackendConfig::File {
                path: dir.path().join("graph.json"),
            },
        };

        let db = Database::open(&config).await.unwrap();
        assert_eq!(db.backend_name(), "file");
        db.write_transaction(|g| {
            g.insert(project("u1"));
            Ok(())
        })
        .await
        .unwrap();
        drop(db);

        let reopened = Database::open(&config).await.unwrap();
        assert_eq!(reopened.counts()["projects"], 1);
    }
}
