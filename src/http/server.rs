//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the API handlers
//! - Wire up middleware (request ids, tracing, timeout, body limit, metrics)
//! - Serve on a bound listener until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::accounts::UserStore;
use crate::api::{self, TokenIssuer};
use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id, set_request_id, RequestIdExt};
use crate::observability::metrics;
use crate::pinning::PinningService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    /// `None` when no JWT secret is configured; login and verify then fail.
    pub tokens: Option<Arc<TokenIssuer>>,
    /// `None` when no pinning credential is configured.
    pub pinning: Option<Arc<dyn PinningService>>,
}

/// HTTP server for the portal backend.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        api::router(state)
            .layer(DefaultBodyLimit::max(config.max_body_size))
            .layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %req.headers().request_id(),
                )
            }))
            .layer(set_request_id())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), started);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::MemoryUserStore;
    use crate::config::AuthConfig;
    use crate::http::request::X_REQUEST_ID;
    use axum::http::{Method, Request as HttpRequest, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server(tokens: bool) -> HttpServer {
        let tokens = tokens.then(|| {
            Arc::new(
                TokenIssuer::new(&AuthConfig {
                    jwt_secret: "test-secret".into(),
                    token_ttl_secs: 3600,
                })
                .unwrap(),
            )
        });
        let state = AppState {
            users: Arc::new(MemoryUserStore::new()),
            tokens,
            pinning: None,
        };
        HttpServer::new(&ServerConfig::default(), state)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = server(true)
            .router()
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = server(true)
            .router()
            .oneshot(
                HttpRequest::get("/health")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_get_on_api_route_is_405() {
        let response = server(true)
            .router()
            .oneshot(HttpRequest::get("/api/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let router = server(true).router();
        let user = json!({"name": "Ada", "email": "ada@example.com", "password": "pw"});

        let response = router
            .clone()
            .oneshot(json_request(Method::POST, "/api/register", user.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(json_request(Method::POST, "/api/register", user))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Email already exists.");

        let response = router
            .oneshot(json_request(
                Method::POST,
                "/api/login",
                json!({"email": "ada@example.com", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_field_is_400() {
        let response = server(true)
            .router()
            .oneshot(json_request(
                Method::POST,
                "/api/register",
                json!({"name": "Ada", "email": "ada@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_login_without_secret_is_500() {
        let router = server(false).router();
        router
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/register",
                json!({"name": "Ada", "email": "ada@example.com", "password": "pw"}),
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(json_request(
                Method::POST,
                "/api/login",
                json!({"email": "ada@example.com", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upload_without_pinning_is_500() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
        );
        let request = HttpRequest::post("/api/upload-to-pinata")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let response = server(true).router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Upload to Pinata failed");
    }
}
