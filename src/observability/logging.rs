//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber once per process
//! - Resolve the filter from `RUST_LOG`, falling back to configuration
//!
//! # Design Decisions
//! - `tracing` + `tracing-subscriber` with an `EnvFilter`
//! - Human-readable fmt layer; secrets are never passed as fields

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber.
///
/// Calling this twice is harmless; the second installation is ignored.
pub fn init(config: &ObservabilityConfig) {
    let result = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
