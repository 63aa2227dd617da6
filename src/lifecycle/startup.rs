//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated `PortalConfig` into the server's `AppState`
//! - Choose the user store (Postgres, or in-memory when no database is configured)
//! - Build the token issuer and pinning client when their secrets are present
//!
//! # Design Decisions
//! - The Postgres pool is lazy; an unreachable database fails requests, not startup
//! - Missing secrets are logged by name only, never by value

use std::sync::Arc;

use thiserror::Error;

use crate::accounts::{AccountError, MemoryUserStore, PgUserStore, UserStore};
use crate::api::{AuthError, TokenIssuer};
use crate::config::PortalConfig;
use crate::http::AppState;
use crate::pinning::{PinataClient, PinningError, PinningService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("user store: {0}")]
    Accounts(#[from] AccountError),

    #[error("pinning client: {0}")]
    Pinning(#[from] PinningError),
}

/// Build the shared application state from configuration.
pub async fn bootstrap(config: &PortalConfig) -> Result<AppState, StartupError> {
    let users: Arc<dyn UserStore> = if config.database.url.is_empty() {
        tracing::warn!("DATABASE_URL is not set; users are kept in memory only");
        Arc::new(MemoryUserStore::new())
    } else {
        let store = PgUserStore::connect_lazy(&config.database)?;
        if let Err(e) = store.ensure_schema().await {
            tracing::warn!(error = %e, "Could not ensure users table; continuing");
        }
        Arc::new(store)
    };

    let tokens = match TokenIssuer::new(&config.auth) {
        Ok(issuer) => Some(Arc::new(issuer)),
        Err(AuthError::MissingSecret) => {
            tracing::warn!("JWT_SECRET is not set; login and verify will fail");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Token issuer unavailable");
            None
        }
    };

    let pinning: Option<Arc<dyn PinningService>> = if config.pinning.jwt.is_empty() {
        tracing::warn!("PINATA_JWT is not set; uploads will fail");
        None
    } else {
        Some(Arc::new(PinataClient::new(&config.pinning)?))
    };

    tracing::info!(
        persistent_users = !config.database.url.is_empty(),
        tokens = tokens.is_some(),
        pinning = pinning.is_some(),
        "Application state ready"
    );

    Ok(AppState {
        users,
        tokens,
        pinning,
    })
}
