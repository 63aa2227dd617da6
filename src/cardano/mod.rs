//! Cardano integration subsystem.
//!
//! # Data Flow
//! ```text
//! Workflow
//!     → wallet.rs (addresses, UTxOs, collateral, sign, submit)
//!     → provider.rs (UTxOs by address/tx, protocol parameters, asset metadata)
//!     → address.rs / native_script.rs / plutus_data.rs (local encoding)
//!     → transaction.rs (DraftBuilder<Open> → DraftBuilder<Balanced> → TxDraft)
//!     → engine.rs (parameterize validators, complete draft to CBOR)
//!     → wallet.rs (sign, submit)
//! ```
//!
//! # Design Decisions
//! - Wallet, provider and engine are traits; the workflows never see a
//!   concrete SDK
//! - Encodings that are cheap and deterministic (addresses, native script
//!   hashes, datums) are done locally so they can be tested offline

pub mod address;
pub mod blueprint;
pub mod engine;
pub mod native_script;
pub mod plutus_data;
pub mod provider;
pub mod slot;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use address::{AddressError, AddressParts, Credential};
pub use engine::{resolve_script, ResolvedScript, TxEngine};
pub use native_script::NativeScript;
pub use plutus_data::PlutusData;
pub use provider::{BlockfrostProvider, ChainProvider};
pub use slot::SlotConfig;
pub use transaction::{DatumSource, DraftBuilder, DraftError, TxDraft};
pub use types::{
    Asset, ChainError, ChainResult, Network, OutputData, OutputRef, PlutusScript, PlutusVersion,
    ProtocolParameters, Utxo, LOVELACE,
};
pub use wallet::Wallet;
