//! Persistence gateway: SQLite via sqlx.
//!
//! # Design Decisions
//! - One cloneable `Database` handle wrapping the pool, injected via AppState
//! - All statements parameterized; addresses normalized by the caller
//! - Referential integrity (natural-key FKs, cascade) lives in the schema,
//!   not in application code
//! - Engine errors surface as opaque `StorageError::Query`

pub mod db;
pub mod models;
pub mod queries;

pub use db::{Database, StorageError};
pub use models::{ChainOperation, InteractionStatus, KrnlInteraction, Transaction, TxStatus, User};
