//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the Klunkaz API service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings (bind address, timeouts, body limits).
    pub server: ServerConfig,

    /// SQLite storage settings.
    pub database: DatabaseConfig,

    /// Blockchain provider settings.
    pub chain: ChainConfig,

    /// Krnl third-party integration settings.
    pub krnl: KrnlConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Runtime mode. `development` exposes error details in responses,
    /// `production` keeps them opaque.
    pub runtime_mode: RuntimeMode,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file. Parent directories are created on open.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/klunkaz.db".to_string(),
        }
    }
}

/// Blockchain provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Human-readable network name reported in responses.
    pub network_name: String,

    /// Expected chain ID (8453 for Base mainnet).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum attempts for the retrying query workflow.
    pub max_retries: u32,

    /// Base delay for the linear retry backoff in milliseconds.
    /// Attempt `n` sleeps `n * retry_base_delay_ms` before the next try.
    pub retry_base_delay_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://mainnet.base.org".to_string(),
            network_name: "Base".to_string(),
            chain_id: 8453,
            rpc_timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Krnl integration configuration.
///
/// The executor is currently a mock; the key is held but never sent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KrnlConfig {
    /// API key for the Krnl service.
    pub api_key: String,
}

impl Default for KrnlConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Runtime mode controlling error-detail exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    /// Whether error responses should carry the underlying error chain.
    pub fn expose_details(self) -> bool {
        matches!(self, RuntimeMode::Development)
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "production" | "prod" => Ok(RuntimeMode::Production),
            other => Err(format!("unknown runtime mode '{}'", other)),
        }
    }
}
