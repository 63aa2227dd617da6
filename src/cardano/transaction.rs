//! Transaction drafts.
//!
//! # Responsibilities
//! - Collect everything a transaction needs (inputs, outputs, mints,
//!   metadata, bounds, signers, collateral) in a fixed order
//! - Reject incomplete or contradictory drafts before they reach the engine
//!
//! # Design Decisions
//! - Typestate: `DraftBuilder<Open>` accepts components, `change_address`
//!   moves it to `DraftBuilder<Balanced>`, and only `Balanced` can
//!   `finalize`. Calling `finalize` early or adding inputs after balancing
//!   does not compile.
//! - The finished `TxDraft` is plain serializable data; balancing, fee
//!   calculation and coin selection belong to the `TxEngine`

use std::marker::PhantomData;

use serde::Serialize;
use thiserror::Error;

use crate::cardano::plutus_data::PlutusData;
use crate::cardano::types::{Asset, Network, PlutusScript, ProtocolParameters, Utxo};

/// Errors detected when finalizing a draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("transaction has no inputs and no UTxOs to select from")]
    NoInputSource,

    #[error("Plutus script spending or minting requires collateral")]
    MissingCollateral,

    #[error("validity interval is empty: invalid before {before}, invalid hereafter {hereafter}")]
    InvertedBounds { before: u64, hereafter: u64 },

    #[error("change address is empty")]
    MissingChangeAddress,

    #[error("mint quantity must not be zero")]
    ZeroMint,
}

/// Where the datum of a spent script output comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DatumSource {
    /// The output carries an inline datum.
    Inline,
    /// The datum value is supplied (output was locked by hash).
    Value(PlutusData),
}

/// How an input is witnessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputWitness {
    PubKey,
    NativeScript {
        script_cbor: String,
    },
    Plutus {
        script: PlutusScript,
        datum: DatumSource,
        redeemer: PlutusData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxInput {
    pub utxo: Utxo,
    pub witness: InputWitness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutputDatum {
    None,
    Hash(PlutusData),
    Inline(PlutusData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutput {
    pub address: String,
    pub amount: Vec<Asset>,
    pub datum: OutputDatum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MintWitness {
    Native { script_cbor: String },
    Plutus { script: PlutusScript, redeemer: PlutusData },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mint {
    pub policy_id: String,
    pub asset_name_hex: String,
    pub quantity: i64,
    pub witness: MintWitness,
}

impl Mint {
    /// Policy id followed by asset name.
    pub fn unit(&self) -> String {
        format!("{}{}", self.policy_id, self.asset_name_hex)
    }
}

/// A complete description of a transaction, ready for the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxDraft {
    pub network: Network,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub mints: Vec<Mint>,
    /// Transaction metadata by label.
    pub metadata: Vec<(u64, serde_json::Value)>,
    pub collateral: Option<Utxo>,
    pub required_signers: Vec<String>,
    pub invalid_before: Option<u64>,
    pub invalid_hereafter: Option<u64>,
    /// UTxOs the engine may select from to cover outputs and fees.
    pub selection: Vec<Utxo>,
    pub change_address: String,
    pub protocol_parameters: Option<ProtocolParameters>,
}

impl TxDraft {
    fn needs_collateral(&self) -> bool {
        self.inputs
            .iter()
            .any(|i| matches!(i.witness, InputWitness::Plutus { .. }))
            || self
                .mints
                .iter()
                .any(|m| matches!(m.witness, MintWitness::Plutus { .. }))
    }
}

/// Accepting components.
#[derive(Debug)]
pub struct Open;

/// Change address set; ready to finalize.
#[derive(Debug)]
pub struct Balanced;

/// Ordered draft builder.
#[derive(Debug)]
pub struct DraftBuilder<S> {
    draft: TxDraft,
    _state: PhantomData<S>,
}

impl DraftBuilder<Open> {
    pub fn new(network: Network) -> Self {
        Self {
            draft: TxDraft {
                network,
                inputs: Vec::new(),
                outputs: Vec::new(),
                mints: Vec::new(),
                metadata: Vec::new(),
                collateral: None,
                required_signers: Vec::new(),
                invalid_before: None,
                invalid_hereafter: None,
                selection: Vec::new(),
                change_address: String::new(),
                protocol_parameters: None,
            },
            _state: PhantomData,
        }
    }

    /// Spend a key-locked UTxO.
    pub fn spend(mut self, utxo: Utxo) -> Self {
        self.draft.inputs.push(TxInput {
            utxo,
            witness: InputWitness::PubKey,
        });
        self
    }

    /// Spend a UTxO locked by a native script.
    pub fn spend_native_script(mut self, utxo: Utxo, script_cbor: impl Into<String>) -> Self {
        self.draft.inputs.push(TxInput {
            utxo,
            witness: InputWitness::NativeScript {
                script_cbor: script_cbor.into(),
            },
        });
        self
    }

    /// Spend a UTxO locked by a Plutus validator.
    pub fn spend_plutus_script(
        mut self,
        utxo: Utxo,
        script: PlutusScript,
        datum: DatumSource,
        redeemer: PlutusData,
    ) -> Self {
        self.draft.inputs.push(TxInput {
            utxo,
            witness: InputWitness::Plutus {
                script,
                datum,
                redeemer,
            },
        });
        self
    }

    pub fn pay_to(self, address: impl Into<String>, amount: Vec<Asset>) -> Self {
        self.output(address.into(), amount, OutputDatum::None)
    }

    /// Pay to an address, attaching `datum` by hash.
    pub fn pay_to_with_datum_hash(
        self,
        address: impl Into<String>,
        amount: Vec<Asset>,
        datum: PlutusData,
    ) -> Self {
        self.output(address.into(), amount, OutputDatum::Hash(datum))
    }

    /// Pay to an address with an inline datum.
    pub fn pay_to_with_inline_datum(
        self,
        address: impl Into<String>,
        amount: Vec<Asset>,
        datum: PlutusData,
    ) -> Self {
        self.output(address.into(), amount, OutputDatum::Inline(datum))
    }

    fn output(mut self, address: String, amount: Vec<Asset>, datum: OutputDatum) -> Self {
        self.draft.outputs.push(TxOutput {
            address,
            amount,
            datum,
        });
        self
    }

    pub fn mint_native(
        mut self,
        quantity: i64,
        policy_id: impl Into<String>,
        asset_name_hex: impl Into<String>,
        script_cbor: impl Into<String>,
    ) -> Self {
        self.draft.mints.push(Mint {
            policy_id: policy_id.into(),
            asset_name_hex: asset_name_hex.into(),
            quantity,
            witness: MintWitness::Native {
                script_cbor: script_cbor.into(),
            },
        });
        self
    }

    pub fn mint_plutus(
        mut self,
        quantity: i64,
        policy_id: impl Into<String>,
        asset_name_hex: impl Into<String>,
        script: PlutusScript,
        redeemer: PlutusData,
    ) -> Self {
        self.draft.mints.push(Mint {
            policy_id: policy_id.into(),
            asset_name_hex: asset_name_hex.into(),
            quantity,
            witness: MintWitness::Plutus { script, redeemer },
        });
        self
    }

    pub fn metadata(mut self, label: u64, value: serde_json::Value) -> Self {
        self.draft.metadata.push((label, value));
        self
    }

    pub fn collateral(mut self, utxo: Utxo) -> Self {
        self.draft.collateral = Some(utxo);
        self
    }

    pub fn required_signer(mut self, key_hash: impl Into<String>) -> Self {
        self.draft.required_signers.push(key_hash.into());
        self
    }

    pub fn invalid_before(mut self, slot: u64) -> Self {
        self.draft.invalid_before = Some(slot);
        self
    }

    pub fn invalid_hereafter(mut self, slot: u64) -> Self {
        self.draft.invalid_hereafter = Some(slot);
        self
    }

    /// UTxOs available for coin selection.
    pub fn select_from(mut self, utxos: Vec<Utxo>) -> Self {
        self.draft.selection = utxos;
        self
    }

    pub fn protocol_parameters(mut self, params: ProtocolParameters) -> Self {
        self.draft.protocol_parameters = Some(params);
        self
    }

    /// Set the change address. No components can be added afterwards.
    pub fn change_address(mut self, address: impl Into<String>) -> DraftBuilder<Balanced> {
        self.draft.change_address = address.into();
        DraftBuilder {
            draft: self.draft,
            _state: PhantomData,
        }
    }
}

impl DraftBuilder<Balanced> {
    /// Check the draft and release it.
    pub fn finalize(self) -> Result<TxDraft, DraftError> {
        let draft = self.draft;

        if draft.change_address.trim().is_empty() {
            return Err(DraftError::MissingChangeAddress);
        }
        if draft.inputs.is_empty() && draft.selection.is_empty() {
            return Err(DraftError::NoInputSource);
        }
        if draft.mints.iter().any(|m| m.quantity == 0) {
            return Err(DraftError::ZeroMint);
        }
        if draft.needs_collateral() && draft.collateral.is_none() {
            return Err(DraftError::MissingCollateral);
        }
        if let (Some(before), Some(hereafter)) = (draft.invalid_before, draft.invalid_hereafter) {
            if before >= hereafter {
                return Err(DraftError::InvertedBounds { before, hereafter });
            }
        }

        Ok(draft)
    }
}
