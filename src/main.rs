//! Cardano wallet portal backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser / portal-cli
//!         │
//!         ▼
//!     ┌──────────────────────────── cardano-portal ───────────────────────────┐
//!     │  http (request id, trace, timeout, body limit, metrics)                │
//!     │     │                                                                  │
//!     │     ▼                                                                  │
//!     │  api ── register/login ──▶ accounts (Postgres | memory)                │
//!     │      ── verify ──────────▶ TokenIssuer (HS256)                         │
//!     │      ── upload ──────────▶ pinning (Pinata) ──▶ IPFS                   │
//!     │                                                                        │
//!     │  config · observability · lifecycle (startup, signals, shutdown)       │
//!     └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `cardano-portal [config.toml]`. Without a path the configuration is
//! built from defaults and the environment (`.env` is read first if present).

use std::path::PathBuf;

use tokio::net::TcpListener;

use cardano_portal::config::{load_config, load_from_env};
use cardano_portal::lifecycle::{bootstrap, signals, Shutdown};
use cardano_portal::observability::{logging, metrics};
use cardano_portal::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => load_config(&path)?,
        None => load_from_env()?,
    };

    logging::init(&config.observability);
    tracing::info!("cardano-portal v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        network = %config.chain.network,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = bootstrap(&config).await?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stopped = shutdown.signalled();
    signals::spawn_signal_handler(shutdown);

    HttpServer::new(&config.server, state)
        .run(listener, stopped)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
