//! Pinata upload client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use crate::config::PinningConfig;

/// Errors raised while pinning a file.
#[derive(Debug, Error)]
pub enum PinningError {
    #[error("Pinning credential is not configured")]
    NotConfigured,

    #[error("Pinning request failed: {0}")]
    Request(String),

    #[error("Pinning service rejected the upload (HTTP {status})")]
    Rejected { status: u16 },

    #[error("Pinning service returned an unexpected response: {0}")]
    InvalidResponse(String),
}

pub type PinningResult<T> = Result<T, PinningError>;

/// Stores a file on IPFS and returns its content id.
#[async_trait]
pub trait PinningService: Send + Sync {
    async fn pin_file(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> PinningResult<String>;
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinata `pinFileToIPFS` client.
#[derive(Clone)]
pub struct PinataClient {
    client: reqwest::Client,
    api_url: String,
    jwt: String,
}

impl PinataClient {
    pub fn new(config: &PinningConfig) -> PinningResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PinningError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            jwt: config.jwt.clone(),
        })
    }
}

#[async_trait]
impl PinningService for PinataClient {
    async fn pin_file(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> PinningResult<String> {
        if self.jwt.is_empty() {
            return Err(PinningError::NotConfigured);
        }

        let size = bytes.len();
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(content_type) = content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| PinningError::Request(e.to_string()))?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PinningError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), file_name, "Pinning upload rejected");
            return Err(PinningError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| PinningError::InvalidResponse(e.to_string()))?;

        tracing::info!(cid = %body.ipfs_hash, file_name, size, "File pinned");
        Ok(body.ipfs_hash)
    }
}

impl std::fmt::Debug for PinataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataClient")
            .field("api_url", &self.api_url)
            .finish()
    }
}
