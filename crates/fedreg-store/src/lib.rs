//! # Federation Registry Store
//!
//! Embedded property graph holding the registry entities:
//! - One table per node kind, one edge table per relationship type
//! - Read and write transactions (writers serialized, copy-on-write commit)
//!
//! ## Backends
//!
//! - **InMemory**: nothing persisted (default)
//! - **File**: JSON snapshot rewritten atomically after every commit
//!
//! ## Example
//!
//! ```rust
//! use fedreg_store::Database;
//!
//! #[tokio::main]
//! async fn main() -> fedreg_core::Result<()> {
//!     let db = Database::in_memory();
//!     let providers = db.read_transaction(|g| Ok(g.providers.len()))?;
//!     assert_eq!(providers, 0);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

mod backend;
mod config;
mod database;
mod graph;
mod relation;

pub use backend::{FileBackend, InMemoryBackend, StorageBackend};
pub use config::{BackendConfig, StorageConfig};
pub use database::Database;
pub use graph::{Graph, GraphNode, Table};
pub use relation::{Edge, Relation};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::backend::{FileBackend, InMemoryBackend, StorageBackend};
    pub use crate::config::{BackendConfig, StorageConfig};
    pub use crate::database::Database;
    pub use crate::graph::{Graph, GraphNode, Table};
    pub use crate::relation::Relation;
}
