//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns all violations at once rather than stopping at the first, so an
//! operator can fix a config file in one pass.

use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic violation found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "server.bind_address",
            message: format!("'{}' is not a valid socket address", config.server.bind_address),
        });
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "server.request_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.database.path.is_empty() {
        errors.push(ValidationError {
            field: "database.path",
            message: "must not be empty".to_string(),
        });
    }

    if let Err(e) = url::Url::parse(&config.chain.rpc_url) {
        errors.push(ValidationError {
            field: "chain.rpc_url",
            message: format!("'{}' is not a valid URL: {}", config.chain.rpc_url, e),
        });
    }

    if config.chain.max_retries == 0 {
        errors.push(ValidationError {
            field: "chain.max_retries",
            message: "must be at least 1".to_string(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!(
                "'{}' is not a valid socket address",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
