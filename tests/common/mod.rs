//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use cardano_portal::accounts::{MemoryUserStore, UserStore};
use cardano_portal::api::TokenIssuer;
use cardano_portal::config::{AuthConfig, ServerConfig};
use cardano_portal::pinning::{PinningError, PinningResult, PinningService};
use cardano_portal::{AppState, HttpServer, Shutdown};

pub const JWT_SECRET: &str = "integration-secret";

/// A file the pinning double received.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct PinnedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Pinning service answering from a script of results; an exhausted script fails.
#[derive(Default)]
pub struct ScriptedPinning {
    script: Mutex<VecDeque<PinningResult<String>>>,
    received: Mutex<Vec<PinnedFile>>,
}

#[allow(dead_code)]
impl ScriptedPinning {
    pub fn new(script: Vec<PinningResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<PinnedFile> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl PinningService for ScriptedPinning {
    async fn pin_file(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> PinningResult<String> {
        self.received.lock().unwrap().push(PinnedFile {
            file_name: file_name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes,
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(PinningError::Rejected { status: 500 }))
    }
}

#[allow(dead_code)]
pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig {
        jwt_secret: JWT_SECRET.to_string(),
        token_ttl_secs: 3600,
    })
    .unwrap()
}

/// Default test state: in-memory users, tokens on, no pinning.
#[allow(dead_code)]
pub fn memory_state() -> AppState {
    AppState {
        users: Arc::new(MemoryUserStore::new()),
        tokens: Some(Arc::new(token_issuer())),
        pinning: None,
    }
}

/// A portal running on a loopback port.
#[allow(dead_code)]
pub struct RunningPortal {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningPortal {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start the portal on an ephemeral port.
pub async fn start_portal(state: AppState) -> RunningPortal {
    start_portal_with(ServerConfig::default(), state).await
}

#[allow(dead_code)]
pub async fn start_portal_with(config: ServerConfig, state: AppState) -> RunningPortal {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, state);
    let handle = tokio::spawn(server.run(listener, shutdown.signalled()));

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    RunningPortal { addr, shutdown, handle }
}

/// State with `pinning` plugged in.
#[allow(dead_code)]
pub fn with_pinning(pinning: Arc<dyn PinningService>) -> AppState {
    AppState {
        pinning: Some(pinning),
        ..memory_state()
    }
}

/// State using `users` as the account store.
#[allow(dead_code)]
pub fn with_users(users: Arc<dyn UserStore>) -> AppState {
    AppState {
        users,
        ..memory_state()
    }
}

#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
