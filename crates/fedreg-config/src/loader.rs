//! Configuration loading

use crate::{Config, ConfigFormat};
use fedreg_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Overrides the listen address
pub const ENV_LISTEN: &str = "FEDREG_LISTEN";

/// Overrides the log level
pub const ENV_LOG_LEVEL: &str = "FEDREG_LOG_LEVEL";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::-(?P<default>[^}]*))?\}")
        .expect("valid placeholder regex")
});

/// Read and parse a configuration file; the format follows the extension
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let raw = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read {}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), ?format, "Loading configuration file");
    load_from_str(&raw, format)
}

/// Substitute `${NAME}` and `${NAME:-fallback}` placeholders. Every unset
/// variable without a fallback is reported at once.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut missing = Vec::new();
    let expanded = PLACEHOLDER.replace_all(content, |caps: &Captures<'_>| {
        let name = &caps["name"];
        env::var(name)
            .ok()
            .or_else(|| caps.name("default").map(|d| d.as_str().to_string()))
            .unwrap_or_else(|| {
                missing.push(name.to_string());
                String::new()
            })
    });

    if missing.is_empty() {
        Ok(expanded.into_owned())
    } else {
        Err(Error::Config(format!(
            "Unset environment variables without default: {}",
            missing.join(", ")
        )))
    }
}

/// Parse configuration text in the given format
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let content = expand_env_vars(content)?;
    let parsed = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| Error::Config(format!("Invalid {format:?} configuration: {e}")))
}

/// Apply `FEDREG_LISTEN` and `FEDREG_LOG_LEVEL` on top of `config`
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(listen) = env::var(ENV_LISTEN) {
        config.server.listen = listen
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {ENV_LISTEN} '{listen}': {e}")))?;
        debug!(listen = %config.server.listen, "Listen address overridden from environment");
    }
    if let Ok(level) = env::var(ENV_LOG_LEVEL) {
        debug!(level = %level, "Log level overridden from environment");
        config.observability.log_level = level;
    }
    Ok(())
}

/// Load the configuration file, or the built-in defaults when `path` is
/// `None`, then apply environment overrides and validate.
pub fn load_config<P: AsRef<Path>>(path: Option<P>, env_overrides: bool) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };

    if env_overrides {
        apply_env_overrides(&mut config)?;
    }

    crate::validator::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedreg_store::BackendConfig;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    const YAML_CONFIG: &str = r#"
server:
  listen: "127.0.0.1:9000"
  request_timeout: "10s"
  max_body_size: 1048576

storage:
  backend:
    type: file
    path: /var/lib/fedreg/graph.json

auth:
  jwt_secret: "s3cret"
  admin_subjects: ["alice"]

observability:
  log_level: debug
  json_logs: true
"#;

    #[test]
    fn test_load_yaml() {
        let config = load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(config.server.request_timeout, Duration::from_secs(10));
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(
            config.storage.backend,
            BackendConfig::File {
                path: PathBuf::from("/var/lib/fedreg/graph.json")
            }
        );
        assert_eq!(config.auth.admin_subjects, vec!["alice"]);
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[server]
listen = "0.0.0.0:8080"
api_prefix = "/fedreg/api/v1"

[storage.backend]
type = "inmemory"
"#;
        let config = load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.server.api_prefix, "/fedreg/api/v1");
        assert_eq!(config.storage.backend, BackendConfig::InMemory);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = load_from_str("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = load_from_str("server: [yaml", ConfigFormat::Yaml);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("FEDREG_TEST_PORT", "9191");
        env::remove_var("FEDREG_TEST_UNSET_SECRET");

        let content = r#"
server:
  listen: "127.0.0.1:${FEDREG_TEST_PORT}"
auth:
  jwt_secret: "${FEDREG_TEST_UNSET_SECRET:-fallback}"
"#;
        let config = load_from_str(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.server.listen.port(), 9191);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("fallback"));

        env::remove_var("FEDREG_TEST_PORT");
    }

    #[test]
    fn test_env_var_missing_without_default() {
        env::remove_var("FEDREG_TEST_MISSING");
        let err = load_from_str("auth:\n  jwt_secret: ${FEDREG_TEST_MISSING}\n", ConfigFormat::Yaml)
            .unwrap_err();
        assert!(err.to_string().contains("FEDREG_TEST_MISSING"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML_CONFIG.as_bytes()).unwrap();

        let config = load_config(Some(file.path()), false).unwrap();
        assert_eq!(config.server.listen.port(), 9000);
    }

    #[test]
    fn test_load_config_without_file() {
        let config = load_config(None::<&Path>, false).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file() {
        let result = load_from_file("/nonexistent/fedreg.yaml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
