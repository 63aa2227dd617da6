//! Typed client for the cardano-portal backend API.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The portal answered with an error body.
    #[error("portal returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

pub type SdkResult<T> = Result<T, SdkError>;

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub cid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> SdkResult<MessageResponse> {
        let resp = self
            .client
            .post(self.url("/api/register"))
            .json(&RegisterRequest { name, email, password })
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> SdkResult<LoginResponse> {
        let resp = self
            .client
            .post(self.url("/api/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        parse(resp).await
    }

    /// Check a session token with the portal.
    pub async fn verify(&self, token: &str) -> SdkResult<MessageResponse> {
        let resp = self
            .client
            .post(self.url("/api/verify"))
            .bearer_auth(token)
            .send()
            .await?;
        parse(resp).await
    }

    /// Relay a file to IPFS through the portal; returns the CID.
    pub async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> SdkResult<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let resp = self
            .client
            .post(self.url("/api/upload-to-pinata"))
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        parse::<UploadResponse>(resp).await.map(|r| r.cid)
    }

    pub async fn health(&self) -> SdkResult<HealthResponse> {
        let resp = self.client.get(self.url("/health")).send().await?;
        parse(resp).await
    }
}

async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> SdkResult<T> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        return Err(SdkError::Api { status, message });
    }

    serde_json::from_str(&text).map_err(|e| SdkError::Decode(e.to_string()))
}
