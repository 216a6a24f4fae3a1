//! Klunkaz API service
//!
//! A thin REST backend for the Klunkaz demo frontend: user profiles,
//! wallet balance lookups against a JSON-RPC provider, transaction
//! logging, and the mocked Krnl action executor.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                 KLUNKAZ API                    │
//!                     │                                                │
//!   Client Request    │  ┌────────┐   ┌──────────────┐                 │
//!   ──────────────────┼─▶│  http  │──▶│  validator   │                 │
//!                     │  │ router │   │ (address.rs) │                 │
//!                     │  └────────┘   └──────┬───────┘                 │
//!                     │                      │                         │
//!                     │            ┌─────────┴──────────┐              │
//!                     │            ▼                    ▼              │
//!                     │     ┌──────────────┐    ┌──────────────┐       │
//!   Client Response   │     │   storage    │    │  blockchain  │◀──────┼──── JSON-RPC
//!   ◀─────────────────┼─────│  (sqlx/SQLite)│   │ query + retry│       │     provider
//!                     │     └──────────────┘    └──────────────┘       │
//!                     │                                                │
//!                     │  ┌──────────────────────────────────────────┐  │
//!                     │  │          Cross-Cutting Concerns          │  │
//!                     │  │  ┌────────┐ ┌──────┐ ┌───────────────┐   │  │
//!                     │  │  │ config │ │ krnl │ │ observability │   │  │
//!                     │  │  └────────┘ └──────┘ └───────────────┘   │  │
//!                     │  └──────────────────────────────────────────┘  │
//!                     └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use klunkaz_api::blockchain::ChainClient;
use klunkaz_api::config::load_config;
use klunkaz_api::krnl::KrnlExecutor;
use klunkaz_api::observability::{logging, metrics};
use klunkaz_api::{Database, HttpServer};

#[derive(Parser)]
#[command(name = "klunkaz-api", about = "Klunkaz REST backend", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/klunkaz.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(logging::DEFAULT_DIRECTIVE);

    tracing::info!("klunkaz-api v0.1.0 starting");

    let args = Args::parse();
    let config = load_config(&args.config)?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        database = %config.database.path,
        network = %config.chain.network_name,
        runtime_mode = ?config.runtime_mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at config load, parse cannot fail here but stays guarded.
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Handles are built once here and injected; nothing holds process-wide
    // mutable state.
    let db = Database::open(std::path::Path::new(&config.database.path)).await?;
    let chain = ChainClient::new(config.chain.clone()).await?;
    let krnl = KrnlExecutor::new(&config.krnl);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, db, chain, krnl);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
