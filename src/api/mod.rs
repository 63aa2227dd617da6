//! Backend API: accounts, session tokens and the upload relay.
//!
//! # Data Flow
//! ```text
//! POST /api/register       → UserStore::create            → 201 | 400 | 500
//! POST /api/login          → UserStore::find_by_email
//!                          → TokenIssuer::issue           → 200 {token} | 400
//! POST /api/verify         → Authorization: Bearer <jwt>
//!                          → TokenIssuer::verify          → 200 | 401
//! POST /api/upload-to-pinata (multipart "file")
//!                          → PinningService::pin_file     → 200 {cid} | 400 | 500
//! GET  /health                                            → 200 {status: ok}
//! ```
//!
//! # Design Decisions
//! - Every error body is `{"success": false, "error": msg}`
//! - Any other method on an API route answers 405 with the same body

pub mod auth;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

use crate::http::server::AppState;

pub use auth::{bearer_token, AuthError, Claims, TokenIssuer};

/// Routes of the backend API, bound to `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/register",
            post(handlers::register).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/login",
            post(handlers::login).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/verify",
            post(handlers::verify).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/upload-to-pinata",
            post(handlers::upload_to_pinata).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}
