//! # Federation Registry Configuration
//!
//! Configuration management with support for:
//! - Multiple formats (YAML, TOML, JSON)
//! - `${VAR}` / `${VAR:-default}` expansion
//! - `FEDREG_*` environment overrides
//! - Validation
//! - Built-in defaults (the service starts without a file)

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builder;
pub mod loader;
pub mod types;
pub mod validator;

pub use builder::ConfigBuilder;
pub use loader::{apply_env_overrides, load_config, load_from_file, load_from_str};
pub use types::{AuthConfig, Config, ObservabilityConfig, ServerConfig};
pub use validator::validate_config;

use fedreg_core::{Error, Result};
use std::path::Path;

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Pick the format from the file extension (case insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        Ok(match ext.as_str() {
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            "json" => Self::Json,
            _ => {
                return Err(Error::Config(format!(
                    "{}: expected a .yaml, .yml, .toml or .json file",
                    path.display()
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("fedreg.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("/etc/fedreg/fedreg.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(&PathBuf::from("FEDREG.JSON")).unwrap(),
            ConfigFormat::Json
        );
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(ConfigFormat::from_path(&PathBuf::from("fedreg.ini")).is_err());
        assert!(ConfigFormat::from_path(&PathBuf::from("fedreg")).is_err());
    }
}
