//! Ledger-facing types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unit name of the native coin.
pub const LOVELACE: &str = "lovelace";

/// Lovelace per ADA.
pub const LOVELACE_PER_ADA: u64 = 1_000_000;

/// Target network for addresses, slots and transaction assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Preprod,
    Preview,
}

impl Network {
    /// Network id encoded in address headers (1 mainnet, 0 test networks).
    pub fn network_id(self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Preprod | Network::Preview => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Preprod => "preprod",
            Network::Preview => "preview",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "preprod" => Ok(Network::Preprod),
            "preview" => Ok(Network::Preview),
            other => Err(ChainError::Config(format!("unknown network '{}'", other))),
        }
    }
}

/// Plutus language version of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlutusVersion {
    V1,
    V2,
    V3,
}

/// A parameterized Plutus script ready to attach to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlutusScript {
    /// Script CBOR hex after parameter application.
    pub cbor: String,
    pub version: PlutusVersion,
}

/// A quantity of a single asset. `unit` is `lovelace` or policy id + asset name hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub unit: String,
    pub quantity: String,
}

impl Asset {
    pub fn new(unit: impl Into<String>, quantity: impl ToString) -> Self {
        Self {
            unit: unit.into(),
            quantity: quantity.to_string(),
        }
    }

    pub fn lovelace(amount: u64) -> Self {
        Self::new(LOVELACE, amount)
    }
}

/// Reference to a transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub tx_hash: String,
    pub output_index: u32,
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.output_index)
    }
}

/// Contents of an unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputData {
    pub address: String,
    pub amount: Vec<Asset>,
    /// Hash of a datum attached by hash.
    #[serde(default)]
    pub data_hash: Option<String>,
    /// CBOR hex of an inline datum.
    #[serde(default)]
    pub plutus_data: Option<String>,
    /// Hash of an attached reference script.
    #[serde(default)]
    pub script_ref: Option<String>,
}

/// An unspent transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub input: OutputRef,
    pub output: OutputData,
}

impl Utxo {
    /// Quantity of `unit` held, zero when absent or unparsable.
    pub fn quantity_of(&self, unit: &str) -> u64 {
        self.output
            .amount
            .iter()
            .filter(|a| a.unit == unit)
            .filter_map(|a| a.quantity.parse::<u64>().ok())
            .sum()
    }
}

/// The subset of protocol parameters the workflows care about; the rest is
/// carried through untouched for the transaction engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    #[serde(default)]
    pub epoch: u64,
    #[serde(default)]
    pub min_fee_a: u64,
    #[serde(default)]
    pub min_fee_b: u64,
    #[serde(default)]
    pub max_tx_size: u64,
    #[serde(default)]
    pub coins_per_utxo_size: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Errors that can occur while talking to the chain, the wallet or the
/// transaction engine.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Provider request failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider request timed out.
    #[error("Provider timeout after {0} seconds")]
    Timeout(u64),

    /// A looked-up entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Wallet refused or failed an operation.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Transaction engine failed to parameterize, hash or complete.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Malformed ledger data (datum, address, blueprint).
    #[error("Decode error: {0}")]
    Decode(String),

    /// Missing or invalid chain configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
