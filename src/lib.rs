//! Klunkaz API Library

pub mod blockchain;
pub mod config;
pub mod http;
pub mod krnl;
pub mod observability;
pub mod storage;

pub use config::AppConfig;
pub use http::HttpServer;
pub use storage::Database;
