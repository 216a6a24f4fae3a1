//! HTTP route layer.
//!
//! # Data Flow
//! ```text
//! request
//!     → server.rs (router, middleware, injected AppState)
//!     → users.rs / wallet.rs / chain.rs / krnl.rs (validate → act → respond)
//!     → envelope.rs (success {data, metadata} / error {error, code, details, timestamp})
//! ```
//!
//! Every handler follows the same shape: normalize parameters, run the
//! address validator, perform at most one lookup, one write, and/or one
//! chain-workflow call, then wrap the result in the envelope.

pub mod chain;
pub mod envelope;
pub mod krnl;
pub mod server;
pub mod users;
pub mod wallet;

pub use envelope::{ApiError, ApiSuccess};
pub use server::{AppState, HttpServer};
