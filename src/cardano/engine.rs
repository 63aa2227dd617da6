//! Transaction engine capability.
//!
//! The engine is the external serialization library: it applies
//! parameters to compiled validators, hashes Plutus scripts, and turns a
//! finalized `TxDraft` into unsigned transaction CBOR (coin selection,
//! fee and execution-unit estimation, balancing).

use async_trait::async_trait;

use crate::cardano::address::{self, Credential};
use crate::cardano::plutus_data::PlutusData;
use crate::cardano::transaction::TxDraft;
use crate::cardano::types::{ChainError, ChainResult, PlutusScript, PlutusVersion};

#[async_trait]
pub trait TxEngine: Send + Sync {
    /// Apply `params` (in order) to a blueprint's compiled code, returning script CBOR hex.
    fn apply_params(&self, compiled_code: &str, params: &[PlutusData]) -> ChainResult<String>;

    /// Hash of a Plutus script (policy id when minting).
    fn script_hash(&self, script_cbor: &str, version: PlutusVersion) -> ChainResult<String>;

    /// Build the unsigned transaction, returning its CBOR hex.
    async fn complete(&self, draft: &TxDraft) -> ChainResult<String>;
}

/// A Plutus script with its hash and address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScript {
    pub script: PlutusScript,
    pub hash: String,
    pub address: String,
}

/// Parameterize, hash and address a validator.
///
/// With `stake`, the address delegates to that credential; otherwise it
/// is an enterprise script address.
pub fn resolve_script(
    engine: &dyn TxEngine,
    compiled_code: &str,
    params: &[PlutusData],
    version: PlutusVersion,
    stake: Option<Credential>,
    network_id: u8,
) -> ChainResult<ResolvedScript> {
    let cbor = if params.is_empty() {
        compiled_code.to_string()
    } else {
        engine.apply_params(compiled_code, params)?
    };
    let hash = engine.script_hash(&cbor, version)?;
    let address = address::script_address(&hash, stake, network_id)
        .map_err(|e| ChainError::Engine(format!("script address: {}", e)))?;

    Ok(ResolvedScript {
        script: PlutusScript { cbor, version },
        hash,
        address,
    })
}
