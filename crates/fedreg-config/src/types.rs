//! Configuration types

use fedreg_store::StorageConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Graph store
    #[serde(default)]
    pub storage: StorageConfig,

    /// API authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Graceful shutdown timeout (wait for in-flight requests)
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Max request body size (bytes)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Prefix of every API route
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout: default_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            max_body_size: default_max_body_size(),
            api_prefix: default_api_prefix(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret used to verify bearer tokens. Authentication is
    /// disabled when unset.
    pub jwt_secret: Option<String>,

    /// Token subjects allowed to write (empty = any valid token)
    pub admin_subjects: Vec<String>,
}

impl AuthConfig {
    /// Whether bearer tokens are verified at all
    pub fn enabled(&self) -> bool {
        self.jwt_secret.is_some()
    }

    /// Whether `subject` may write
    pub fn is_admin(&self, subject: &str) -> bool {
        self.admin_subjects.is_empty() || self.admin_subjects.iter().any(|s| s == subject)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive
    pub log_level: String,

    /// Emit JSON log lines instead of text
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.server.listen.port(), 8000);
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert_eq!(config.server.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.auth.enabled());
    }

    #[test]
    fn test_admin_subjects() {
        let mut auth = AuthConfig {
            jwt_secret: Some("s3cret".to_string()),
            admin_subjects: Vec::new(),
        };
        assert!(auth.is_admin("anyone"));

        auth.admin_subjects = vec!["alice".to_string()];
        assert!(auth.is_admin("alice"));
        assert!(!auth.is_admin("bob"));
    }
}
