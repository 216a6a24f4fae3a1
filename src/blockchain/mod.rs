//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! validated address (route layer)
//!     → address.rs (format check, lowercase normalize, signature recovery)
//!     → query.rs (bounded-retry workflow, attempt metadata)
//!     → client.rs (RPC connection with per-call timeouts)
//!     → units.rs (wei / ether formatting for responses)
//! ```
//!
//! # Design Decisions
//! - The client holds no retry logic; retrying lives in the query workflow
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the chain is unreachable at startup

pub mod address;
pub mod client;
pub mod query;
pub mod types;
pub mod units;

pub use client::ChainClient;
pub use types::{ChainConfig, ChainError, ChainId, ChainResult};
