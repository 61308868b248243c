//! Configuration builder

use crate::types::Config;
use fedreg_core::Result;
use fedreg_store::{BackendConfig, StorageConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from the built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.config.server.listen = addr;
        self
    }

    /// Set the API route prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.server.api_prefix = prefix.into();
        self
    }

    /// Persist the graph as a JSON snapshot at `path`
    pub fn file_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage = StorageConfig {
            backend: BackendConfig::File { path: path.into() },
        };
        self
    }

    /// Enable bearer token verification
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = Some(secret.into());
        self
    }

    /// Restrict writes to the given token subject
    pub fn admin_subject(mut self, subject: impl Into<String>) -> Self {
        self.config.auth.admin_subjects.push(subject.into());
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}
