//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks, all errors collected)
//!     → AppConfig (validated, immutable)
//!     → shared with all subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the demo boots with no config file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, ChainConfig, DatabaseConfig, KrnlConfig, RuntimeMode, ServerConfig};
