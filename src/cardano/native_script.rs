//! Native (timelock/multisig) scripts.
//!
//! Native scripts are small enough to serialize and hash locally, which
//! gives the multisig flow and the CIP-25 forging policy a deterministic
//! script address and policy id without a round trip to the engine.

use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};
use ciborium::value::Value;

use crate::cardano::address::{self, hash_from_hex, AddressError, AddressParts, Credential};
use crate::cardano::types::{ChainError, ChainResult};

/// Ledger tag prepended to native script bytes before hashing.
const NATIVE_SCRIPT_TAG: u8 = 0x00;

/// A native script expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeScript {
    /// Requires a signature from the key hash.
    Sig { key_hash: String },
    /// All sub-scripts must hold.
    All(Vec<NativeScript>),
    /// At least one sub-script must hold.
    Any(Vec<NativeScript>),
    /// At least `required` sub-scripts must hold.
    AtLeast { required: u32, scripts: Vec<NativeScript> },
    /// Valid from this slot on.
    InvalidBefore(u64),
    /// Valid strictly before this slot.
    InvalidHereafter(u64),
}

impl NativeScript {
    /// Policy requiring a single signature from the payment key of `address`.
    pub fn with_one_signature(address: &str) -> ChainResult<Self> {
        let parts = AddressParts::decode(address).map_err(address_error)?;
        let key_hash = parts
            .pub_key_hash()
            .ok_or_else(|| ChainError::Decode(format!("{} has no payment key", address)))?;
        Ok(NativeScript::Sig { key_hash })
    }

    /// `all` of the given signers.
    pub fn all_of(key_hashes: &[String]) -> Self {
        NativeScript::All(
            key_hashes
                .iter()
                .map(|k| NativeScript::Sig { key_hash: k.clone() })
                .collect(),
        )
    }

    /// CBOR encoding as it appears on chain.
    pub fn to_cbor(&self) -> ChainResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&self.to_value()?, &mut buf)
            .map_err(|e| ChainError::Decode(format!("native script encoding failed: {}", e)))?;
        Ok(buf)
    }

    pub fn to_cbor_hex(&self) -> ChainResult<String> {
        Ok(hex::encode(self.to_cbor()?))
    }

    /// Script hash (policy id when used for minting), hex encoded.
    pub fn hash(&self) -> ChainResult<String> {
        let mut hasher = Blake2b::<U28>::new();
        hasher.update([NATIVE_SCRIPT_TAG]);
        hasher.update(self.to_cbor()?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Enterprise script address for the given network id.
    pub fn address(&self, network_id: u8) -> ChainResult<String> {
        address::script_address(&self.hash()?, None, network_id).map_err(address_error)
    }

    fn to_value(&self) -> ChainResult<Value> {
        let value = match self {
            NativeScript::Sig { key_hash } => {
                let hash = hash_from_hex(key_hash).map_err(address_error)?;
                Value::Array(vec![Value::from(0u8), Value::Bytes(hash.to_vec())])
            }
            NativeScript::All(scripts) => {
                Value::Array(vec![Value::from(1u8), Self::list(scripts)?])
            }
            NativeScript::Any(scripts) => {
                Value::Array(vec![Value::from(2u8), Self::list(scripts)?])
            }
            NativeScript::AtLeast { required, scripts } => Value::Array(vec![
                Value::from(3u8),
                Value::from(*required),
                Self::list(scripts)?,
            ]),
            NativeScript::InvalidBefore(slot) => {
                Value::Array(vec![Value::from(4u8), Value::from(*slot)])
            }
            NativeScript::InvalidHereafter(slot) => {
                Value::Array(vec![Value::from(5u8), Value::from(*slot)])
            }
        };
        Ok(value)
    }

    fn list(scripts: &[NativeScript]) -> ChainResult<Value> {
        Ok(Value::Array(
            scripts
                .iter()
                .map(NativeScript::to_value)
                .collect::<ChainResult<Vec<_>>>()?,
        ))
    }
}

/// Whether the payment credential of `address` is the given native script.
pub fn is_script_address(address: &str, script: &NativeScript) -> ChainResult<bool> {
    let parts = AddressParts::decode(address).map_err(address_error)?;
    let hash = script.hash()?;
    Ok(matches!(parts.payment, Credential::Script(h) if hex::encode(h) == hash))
}

fn address_error(e: AddressError) -> ChainError {
    ChainError::Decode(e.to_string())
}
