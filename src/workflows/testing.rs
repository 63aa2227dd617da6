//! Recording doubles for the wallet, provider and engine.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};
use serde_json::{Map, Value};

use crate::cardano::address::{AddressParts, Credential};
use crate::cardano::{
    Asset, ChainError, ChainProvider, ChainResult, OutputData, OutputRef, PlutusData,
    PlutusVersion, ProtocolParameters, TxDraft, TxEngine, Utxo, Wallet,
};

/// Base test-network address with payment key `[payment; 28]` and stake key `[stake; 28]`.
pub fn key_address(payment: u8, stake: u8) -> String {
    AddressParts {
        network_id: 0,
        payment: Credential::Key([payment; 28]),
        stake: Some(Credential::Key([stake; 28])),
    }
    .encode()
    .unwrap()
}

pub fn key_hash(byte: u8) -> String {
    hex::encode([byte; 28])
}

pub fn utxo(tx_byte: u8, index: u32, address: &str, lovelace: u64) -> Utxo {
    Utxo {
        input: OutputRef {
            tx_hash: hex::encode([tx_byte; 32]),
            output_index: index,
        },
        output: OutputData {
            address: address.to_string(),
            amount: vec![Asset::lovelace(lovelace)],
            data_hash: None,
            plutus_data: None,
            script_ref: None,
        },
    }
}

pub struct MockWallet {
    pub address: String,
    pub utxos: Vec<Utxo>,
    pub collateral: Vec<Utxo>,
    pub assets: Vec<Asset>,
    pub submit_hash: String,
    pub fail_submit: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockWallet {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            utxos: vec![utxo(0x01, 0, address, 50_000_000)],
            collateral: vec![utxo(0x02, 0, address, 5_000_000)],
            assets: Vec::new(),
            submit_hash: hex::encode([0xee; 32]),
            fail_submit: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn signed(&self) -> bool {
        self.calls().iter().any(|c| c.starts_with("sign_tx"))
    }

    pub fn submitted(&self) -> bool {
        self.calls().iter().any(|c| c.starts_with("submit_tx"))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Wallet for MockWallet {
    async fn change_address(&self) -> ChainResult<String> {
        Ok(self.address.clone())
    }

    async fn used_addresses(&self) -> ChainResult<Vec<String>> {
        Ok(vec![self.address.clone()])
    }

    async fn utxos(&self) -> ChainResult<Vec<Utxo>> {
        Ok(self.utxos.clone())
    }

    async fn collateral(&self) -> ChainResult<Vec<Utxo>> {
        Ok(self.collateral.clone())
    }

    async fn assets(&self) -> ChainResult<Vec<Asset>> {
        Ok(self.assets.clone())
    }

    async fn sign_tx(&self, tx_cbor: &str, partial: bool) -> ChainResult<String> {
        self.record(format!("sign_tx({}, partial={})", tx_cbor, partial));
        Ok(format!("{}+{}", tx_cbor, &self.address[..16]))
    }

    async fn submit_tx(&self, signed_tx: &str) -> ChainResult<String> {
        self.record(format!("submit_tx({})", signed_tx));
        if self.fail_submit {
            return Err(ChainError::Wallet("submission rejected".to_string()));
        }
        Ok(self.submit_hash.clone())
    }
}

#[derive(Default)]
pub struct MockProvider {
    pub address_utxos: Mutex<HashMap<String, Vec<Utxo>>>,
    pub tx_utxos: Mutex<HashMap<String, Vec<Utxo>>>,
    pub asset_metadata: Mutex<HashMap<String, Map<String, Value>>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn with_address_utxos(self, address: &str, utxos: Vec<Utxo>) -> Self {
        self.address_utxos
            .lock()
            .unwrap()
            .insert(address.to_string(), utxos);
        self
    }

    pub fn with_tx_utxos(self, tx_hash: &str, utxos: Vec<Utxo>) -> Self {
        self.tx_utxos.lock().unwrap().insert(tx_hash.to_string(), utxos);
        self
    }

    pub fn with_asset_metadata(self, unit: &str, metadata: Value) -> Self {
        if let Value::Object(map) = metadata {
            self.asset_metadata
                .lock()
                .unwrap()
                .insert(unit.to_string(), map);
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainProvider for MockProvider {
    async fn fetch_address_utxos(
        &self,
        address: &str,
        asset: Option<&str>,
    ) -> ChainResult<Vec<Utxo>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("address_utxos({}, {:?})", address, asset));
        let utxos = self
            .address_utxos
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default();
        Ok(match asset {
            Some(unit) => utxos.into_iter().filter(|u| u.quantity_of(unit) > 0).collect(),
            None => utxos,
        })
    }

    async fn fetch_utxos_by_tx(&self, tx_hash: &str) -> ChainResult<Vec<Utxo>> {
        self.calls.lock().unwrap().push(format!("tx_utxos({})", tx_hash));
        Ok(self
            .tx_utxos
            .lock()
            .unwrap()
            .get(tx_hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_protocol_parameters(&self) -> ChainResult<ProtocolParameters> {
        self.calls.lock().unwrap().push("protocol_parameters".to_string());
        Ok(ProtocolParameters {
            epoch: 100,
            min_fee_a: 44,
            min_fee_b: 155_381,
            max_tx_size: 16_384,
            ..ProtocolParameters::default()
        })
    }

    async fn fetch_asset_metadata(&self, unit: &str) -> ChainResult<Map<String, Value>> {
        self.calls.lock().unwrap().push(format!("asset_metadata({})", unit));
        self.asset_metadata
            .lock()
            .unwrap()
            .get(unit)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("asset {}", unit)))
    }
}

/// Engine that hashes script text and records completed drafts.
#[derive(Default)]
pub struct MockEngine {
    pub drafts: Mutex<Vec<TxDraft>>,
    pub applied: Mutex<Vec<(String, Vec<PlutusData>)>>,
}

impl MockEngine {
    pub fn drafts(&self) -> Vec<TxDraft> {
        self.drafts.lock().unwrap().clone()
    }

    pub fn last_draft(&self) -> TxDraft {
        self.drafts().pop().expect("no draft completed")
    }
}

#[async_trait]
impl TxEngine for MockEngine {
    fn apply_params(&self, compiled_code: &str, params: &[PlutusData]) -> ChainResult<String> {
        self.applied
            .lock()
            .unwrap()
            .push((compiled_code.to_string(), params.to_vec()));
        let mut cbor = compiled_code.to_string();
        for param in params {
            cbor.push_str(&param.to_cbor_hex()?);
        }
        Ok(cbor)
    }

    fn script_hash(&self, script_cbor: &str, _version: PlutusVersion) -> ChainResult<String> {
        let mut hasher = Blake2b::<U28>::new();
        hasher.update(script_cbor.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    async fn complete(&self, draft: &TxDraft) -> ChainResult<String> {
        let mut drafts = self.drafts.lock().unwrap();
        drafts.push(draft.clone());
        Ok(format!("unsigned{}", drafts.len()))
    }
}
