//! Configuration validation

use crate::Config;
use fedreg_core::{Error, Result};
use fedreg_store::BackendConfig;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_storage(config)?;
    validate_auth(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;
    if server.request_timeout.as_secs() == 0 {
        return Err(Error::Config("request_timeout must be > 0".to_string()));
    }

    if server.request_timeout.as_secs() > 300 {
        tracing::warn!("request_timeout is very high (>5 minutes)");
    }

    if server.max_body_size == 0 {
        return Err(Error::Config("max_body_size must be > 0".to_string()));
    }

    if !server.api_prefix.is_empty()
        && (!server.api_prefix.starts_with('/') || server.api_prefix.ends_with('/'))
    {
        return Err(Error::Config(format!(
            "api_prefix '{}' must start with '/' and must not end with '/'",
            server.api_prefix
        )));
    }

    Ok(())
}

fn validate_storage(config: &Config) -> Result<()> {
    if let BackendConfig::File { path } = &config.storage.backend {
        if path.as_os_str().is_empty() {
            return Err(Error::Config("storage file path cannot be empty".to_string()));
        }
    }
    Ok(())
}

fn validate_auth(config: &Config) -> Result<()> {
    match &config.auth.jwt_secret {
        Some(secret) if secret.is_empty() => {
            Err(Error::Config("auth.jwt_secret cannot be empty".to_string()))
        }
        Some(_) => Ok(()),
        None => {
            tracing::warn!("No auth.jwt_secret configured: every caller may write");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.server.request_timeout = Duration::ZERO;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_api_prefix_shape() {
        let mut config = Config::default();
        config.server.api_prefix = "api".to_string();
        assert!(validate_config(&config).is_err());

        config.server.api_prefix = "/api/".to_string();
        assert!(validate_config(&config).is_err());

        config.server.api_prefix = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_storage_path() {
        let mut config = Config::default();
        config.storage.backend = BackendConfig::File {
            path: PathBuf::new(),
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some(String::new());
        assert!(validate_config(&config).is_err());
    }
}
