//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: TOML file, then environment overrides, then validation.
///
/// A missing file is not an error — the demo boots on defaults with zero
/// setup. A present-but-malformed file is.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&content).map_err(ConfigError::Parse)?
    } else {
        tracing::info!(path = %path.display(), "No config file found, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment variable overrides on top of a loaded configuration.
///
/// The variable names are the ones the service has always used:
/// `DB_PATH`, `BASE_RPC_URL`, `KRNL_API_KEY`, `KLUNKAZ_ENV`, `PORT`.
pub fn apply_env_overrides(config: &mut AppConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides<F>(config: &mut AppConfig, get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = get("DB_PATH") {
        config.database.path = path;
    }

    if let Some(url) = get("BASE_RPC_URL") {
        config.chain.rpc_url = url;
    }

    if let Some(key) = get("KRNL_API_KEY") {
        config.krnl.api_key = key;
    }

    if let Some(mode) = get("KLUNKAZ_ENV") {
        match mode.parse() {
            Ok(parsed) => config.runtime_mode = parsed,
            Err(e) => tracing::warn!(value = %mode, "Ignoring KLUNKAZ_ENV: {}", e),
        }
    }

    if let Some(port) = get("PORT") {
        match (port.parse::<u16>(), config.server.bind_address.parse::<std::net::SocketAddr>()) {
            (Ok(port), Ok(mut addr)) => {
                addr.set_port(port);
                config.server.bind_address = addr.to_string();
            }
            _ => tracing::warn!(value = %port, "Ignoring unusable PORT override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RuntimeMode;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_overrides_applied() {
        let vars = overrides(&[
            ("DB_PATH", "/tmp/override.db"),
            ("BASE_RPC_URL", "http://localhost:8545"),
            ("KRNL_API_KEY", "secret"),
            ("KLUNKAZ_ENV", "production"),
            ("PORT", "4000"),
        ]);

        let mut config = AppConfig::default();
        apply_overrides(&mut config, |key| vars.get(key).cloned());

        assert_eq!(config.database.path, "/tmp/override.db");
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
        assert_eq!(config.krnl.api_key, "secret");
        assert_eq!(config.runtime_mode, RuntimeMode::Production);
        assert_eq!(config.server.bind_address, "0.0.0.0:4000");
    }

    #[test]
    fn test_bad_port_ignored() {
        let vars = overrides(&[("PORT", "not-a-port")]);

        let mut config = AppConfig::default();
        apply_overrides(&mut config, |key| vars.get(key).cloned());

        assert_eq!(config.server.bind_address, "0.0.0.0:3001");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/klunkaz.toml")).unwrap();
        assert_eq!(config.chain.max_retries, 3);
    }
}
