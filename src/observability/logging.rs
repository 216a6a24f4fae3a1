//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Respect `RUST_LOG` when set, fall back to the service default
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Log sites carry fields (`address`, `attempt`, `request_id`) rather
//!   than interpolated strings

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "klunkaz_api=debug,tower_http=debug";

/// Initialize the global subscriber. Call exactly once, before anything
/// logs.
pub fn init(default_directive: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
