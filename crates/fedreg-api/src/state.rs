//! Shared handler state

use crate::auth::Authenticator;
use fedreg_config::AuthConfig;
use fedreg_registry::Registry;

/// State shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registry operations
    pub registry: Registry,
    /// Bearer token verification
    pub auth: Authenticator,
}

impl AppState {
    /// Create handler state
    pub fn new(registry: Registry, auth: &AuthConfig) -> Self {
        Self {
            registry,
            auth: Authenticator::new(auth),
        }
    }
}
