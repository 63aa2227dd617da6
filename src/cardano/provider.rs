//! Chain data provider.
//!
//! # Responsibilities
//! - Look up UTxOs by address (optionally filtered by asset) or by transaction
//! - Fetch current protocol parameters
//! - Fetch on-chain (CIP-25/CIP-68) metadata of an asset
//!
//! # Design Decisions
//! - One endpoint, one attempt: nothing is retried, every call is bounded by
//!   the configured timeout
//! - "Not found" from the provider is an empty result for UTxO queries
//! - The project id is sent as a header and never logged

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::time::timeout;
use url::Url;

use crate::cardano::types::{
    Asset, ChainError, ChainResult, OutputData, OutputRef, ProtocolParameters, Utxo,
};
use crate::config::ChainConfig;
use crate::observability::metrics;

/// Page size of Blockfrost list endpoints.
const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched for a single address query.
const MAX_PAGES: usize = 50;

/// Read-only chain queries used by the workflows.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// UTxOs at `address`, oldest first. With `asset`, only UTxOs holding it.
    async fn fetch_address_utxos(&self, address: &str, asset: Option<&str>)
        -> ChainResult<Vec<Utxo>>;

    /// Outputs created by transaction `tx_hash`.
    async fn fetch_utxos_by_tx(&self, tx_hash: &str) -> ChainResult<Vec<Utxo>>;

    async fn fetch_protocol_parameters(&self) -> ChainResult<ProtocolParameters>;

    /// On-chain metadata of an asset unit; empty when the asset has none.
    async fn fetch_asset_metadata(&self, unit: &str) -> ChainResult<Map<String, Value>>;
}

/// Blockfrost REST provider.
#[derive(Clone)]
pub struct BlockfrostProvider {
    client: reqwest::Client,
    base_url: Url,
    project_id: String,
    timeout_duration: Duration,
}

#[derive(Debug, Deserialize)]
struct AddressUtxo {
    tx_hash: String,
    output_index: u32,
    #[serde(default)]
    address: String,
    amount: Vec<Asset>,
    #[serde(default)]
    data_hash: Option<String>,
    #[serde(default)]
    inline_datum: Option<String>,
    #[serde(default)]
    reference_script_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TxUtxos {
    hash: String,
    outputs: Vec<TxOutput>,
}

#[derive(Debug, Deserialize)]
struct TxOutput {
    address: String,
    amount: Vec<Asset>,
    output_index: u32,
    #[serde(default)]
    data_hash: Option<String>,
    #[serde(default)]
    inline_datum: Option<String>,
    #[serde(default)]
    reference_script_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetInfo {
    #[serde(default)]
    onchain_metadata: Option<Map<String, Value>>,
}

impl BlockfrostProvider {
    pub fn new(config: &ChainConfig) -> ChainResult<Self> {
        let base_url = Url::parse(config.provider_url.trim()).map_err(|e| {
            ChainError::Config(format!("invalid provider URL '{}': {}", config.provider_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ChainError::Config(format!(
                "provider URL '{}' cannot carry a path",
                config.provider_url
            )));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChainError::Config(format!("HTTP client: {}", e)))?;

        tracing::info!(
            provider_url = %config.provider_url,
            network = %config.network,
            timeout_secs = config.timeout_secs,
            "Chain provider initialized"
        );

        Ok(Self {
            client,
            base_url,
            project_id: config.project_id.clone(),
            timeout_duration: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Base URL extended with `segments`, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ChainResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChainError::Config(format!("provider URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode JSON. `None` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        url: Url,
    ) -> ChainResult<Option<T>> {
        let path = url.path().to_string();
        let result = self.get_json_inner(url).await;
        metrics::record_chain_call(op, result.is_ok());
        if let Err(e) = &result {
            tracing::warn!(op, path = %path, error = %e, "Chain provider call failed");
        }
        result
    }

    async fn get_json_inner<T: DeserializeOwned>(&self, url: Url) -> ChainResult<Option<T>> {
        let request = self
            .client
            .get(url)
            .header("project_id", &self.project_id)
            .send();

        let response = timeout(self.timeout_duration, request)
            .await
            .map_err(|_| ChainError::Timeout(self.timeout_duration.as_secs()))?
            .map_err(|e| ChainError::Provider(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = timeout(self.timeout_duration, response.json::<T>())
                    .await
                    .map_err(|_| ChainError::Timeout(self.timeout_duration.as_secs()))?
                    .map_err(|e| ChainError::Decode(e.to_string()))?;
                Ok(Some(body))
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(ChainError::Provider(format!("HTTP {}: {}", status, text)))
            }
        }
    }
}

impl From<AddressUtxo> for Utxo {
    fn from(u: AddressUtxo) -> Self {
        Utxo {
            input: OutputRef {
                tx_hash: u.tx_hash,
                output_index: u.output_index,
            },
            output: OutputData {
                address: u.address,
                amount: u.amount,
                data_hash: u.data_hash,
                plutus_data: u.inline_datum,
                script_ref: u.reference_script_hash,
            },
        }
    }
}

#[async_trait]
impl ChainProvider for BlockfrostProvider {
    async fn fetch_address_utxos(
        &self,
        address: &str,
        asset: Option<&str>,
    ) -> ChainResult<Vec<Utxo>> {
        let base = match asset {
            Some(unit) => self.endpoint(&["addresses", address, "utxos", unit])?,
            None => self.endpoint(&["addresses", address, "utxos"])?,
        };

        let mut utxos = Vec::new();
        for page in 1..=MAX_PAGES {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("order", "asc");
            let batch: Vec<AddressUtxo> = match self.get_json("address_utxos", url).await? {
                Some(batch) => batch,
                None => break,
            };
            let len = batch.len();
            utxos.extend(batch.into_iter().map(|u| {
                let mut utxo = Utxo::from(u);
                if utxo.output.address.is_empty() {
                    utxo.output.address = address.to_string();
                }
                utxo
            }));
            if len < PAGE_SIZE {
                break;
            }
        }

        tracing::debug!(address, count = utxos.len(), "Fetched address UTxOs");
        Ok(utxos)
    }

    async fn fetch_utxos_by_tx(&self, tx_hash: &str) -> ChainResult<Vec<Utxo>> {
        let url = self.endpoint(&["txs", tx_hash, "utxos"])?;
        let Some(tx) = self.get_json::<TxUtxos>("tx_utxos", url).await? else {
            return Ok(Vec::new());
        };

        Ok(tx
            .outputs
            .into_iter()
            .map(|o| Utxo {
                input: OutputRef {
                    tx_hash: tx.hash.clone(),
                    output_index: o.output_index,
                },
                output: OutputData {
                    address: o.address,
                    amount: o.amount,
                    data_hash: o.data_hash,
                    plutus_data: o.inline_datum,
                    script_ref: o.reference_script_hash,
                },
            })
            .collect())
    }

    async fn fetch_protocol_parameters(&self) -> ChainResult<ProtocolParameters> {
        let url = self.endpoint(&["epochs", "latest", "parameters"])?;
        self.get_json("protocol_parameters", url)
            .await?
            .ok_or_else(|| ChainError::NotFound("protocol parameters".to_string()))
    }

    async fn fetch_asset_metadata(&self, unit: &str) -> ChainResult<Map<String, Value>> {
        let url = self.endpoint(&["assets", unit])?;
        let info: Option<AssetInfo> = self.get_json("asset_metadata", url).await?;
        info.map(|i| i.onchain_metadata.unwrap_or_default())
            .ok_or_else(|| ChainError::NotFound(format!("asset {}", unit)))
    }
}

impl std::fmt::Debug for BlockfrostProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockfrostProvider")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
