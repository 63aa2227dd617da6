//! Two-party co-signed transfer out of a 2-of-2 native script.
//!
//! # Data Flow
//! ```text
//! fund_script:  wallet UTxO ──▶ script address (full sign, submit)
//! step1:        first cosigner ── script UTxO → recipient ── partial sign
//!                   └──▶ HandoffStore.insert(PendingCosign)  → attempt id
//! step2:        second cosigner ── HandoffStore.get(attempt id)
//!                   ── partial sign ── submit ──▶ HandoffStore.remove
//! step2_from_blob: second cosigner ── pasted partially signed tx
//!                   ── partial sign ── submit
//! ```
//!
//! # Design Decisions
//! - The connected wallet's change address must equal the configured
//!   cosigner for the step; the check runs before any provider or engine
//!   call
//! - The partially signed transaction is handed over as an addressable
//!   record persisted to disk, so step 2 can run in another process
//! - A record is removed only after the second signer's submission succeeds;
//!   failing to persist that removal is logged, the tx hash is still returned
//! - Saves are serialized and written to a sibling temp file, then renamed

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cardano::{Asset, DraftBuilder, NativeScript, Wallet};
use crate::config::MultisigConfig;
use crate::workflows::amount::ada_to_lovelace;
use crate::workflows::{check_address, payment_key_hash, require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

/// The two cosigner addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignConfig {
    pub first: String,
    pub second: String,
}

impl From<&MultisigConfig> for CosignConfig {
    fn from(config: &MultisigConfig) -> Self {
        Self {
            first: config.first_cosigner.clone(),
            second: config.second_cosigner.clone(),
        }
    }
}

impl CosignConfig {
    /// `all` of both cosigners' payment keys.
    pub fn script(&self) -> WorkflowResult<NativeScript> {
        Ok(NativeScript::all_of(&[
            payment_key_hash(&self.first)?,
            payment_key_hash(&self.second)?,
        ]))
    }
}

/// A transfer signed by the first cosigner and waiting for the second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCosign {
    pub attempt_id: Uuid,
    pub partially_signed_tx: String,
    pub script_address: String,
    pub recipient: String,
    pub lovelace: u64,
    pub first_signer: String,
    pub created_at_ms: u64,
}

/// Pending hand-off records keyed by attempt id.
#[derive(Clone, Default)]
pub struct HandoffStore {
    inner: Arc<DashMap<Uuid, PendingCosign>>,
    persistence_path: Option<String>,
    save_lock: Arc<Mutex<()>>,
}

impl HandoffStore {
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load records from `path` if it exists; later changes are written back to it.
    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: HashMap<Uuid, PendingCosign> = serde_json::from_reader(reader)?;
            for (id, record) in records {
                store.inner.insert(id, record);
            }
            tracing::info!(count = store.inner.len(), path, "Loaded pending co-sign records");
        }
        Ok(store)
    }

    pub fn save_to_file(&self) -> std::io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        // Snapshot under the lock so the last writer always sees every insert.
        let _guard = self.save_lock.lock().unwrap_or_else(|p| p.into_inner());
        let records: HashMap<Uuid, PendingCosign> = self
            .inner
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();

        let tmp_path = format!("{}.tmp", path);
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, &records)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        std::fs::rename(&tmp_path, path)?;

        tracing::debug!(count = records.len(), path = %path, "Saved pending co-sign records");
        Ok(())
    }

    pub fn insert(&self, record: PendingCosign) -> WorkflowResult<()> {
        self.inner.insert(record.attempt_id, record);
        self.persist()
    }

    pub fn get(&self, attempt_id: &Uuid) -> Option<PendingCosign> {
        self.inner.get(attempt_id).map(|r| r.value().clone())
    }

    pub fn remove(&self, attempt_id: &Uuid) -> WorkflowResult<Option<PendingCosign>> {
        let removed = self.inner.remove(attempt_id).map(|(_, r)| r);
        self.persist()?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn persist(&self) -> WorkflowResult<()> {
        self.save_to_file()
            .map_err(|e| WorkflowError::Handoff(format!("failed to persist records: {}", e)))
    }
}

/// Co-signing workflow bound to a cosigner pair and a record store.
#[derive(Clone)]
pub struct MultisigTransfer {
    cosigners: CosignConfig,
    store: HandoffStore,
}

impl MultisigTransfer {
    pub fn new(cosigners: CosignConfig, store: HandoffStore) -> Self {
        Self { cosigners, store }
    }

    pub fn store(&self) -> &HandoffStore {
        &self.store
    }

    /// Script address both cosigners control.
    pub fn script_address(&self, ctx: &ChainContext) -> WorkflowResult<String> {
        Ok(self.cosigners.script()?.address(ctx.network_id())?)
    }

    /// Move `ada` from the connected wallet into the script address.
    pub async fn fund_script(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        ada: &str,
    ) -> WorkflowResult<String> {
        run("multisig_fund", async {
            let lovelace = ada_to_lovelace(ada)?;
            let script_address = self.script_address(ctx)?;
            let op = session.begin()?;
            let wallet = op.wallet();

            let address = wallet.change_address().await?;
            let source = ctx
                .provider
                .fetch_address_utxos(&address, None)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| WorkflowError::NotFound("wallet has no UTxO".to_string()))?;
            let params = ctx.provider.fetch_protocol_parameters().await?;
            tracing::info!(script_address = %script_address, lovelace, "Funding co-sign script");

            let draft = DraftBuilder::new(ctx.network)
                .spend(source)
                .pay_to(&script_address, vec![Asset::lovelace(lovelace)])
                .protocol_parameters(params)
                .change_address(address)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            sign_and_submit(wallet, &unsigned, false).await
        })
        .await
    }

    /// First signature. Returns the stored hand-off record.
    pub async fn step1(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        recipient: &str,
        ada: &str,
    ) -> WorkflowResult<PendingCosign> {
        run("multisig_step1", async {
            check_address("recipient", recipient)?;
            let lovelace = ada_to_lovelace(ada)?;
            let op = session.begin()?;
            let wallet = op.wallet();

            let address = wallet.change_address().await?;
            if address != self.cosigners.first {
                return Err(WorkflowError::WrongSigner {
                    expected: self.cosigners.first.clone(),
                    actual: address,
                });
            }

            let script = self.cosigners.script()?;
            let script_address = script.address(ctx.network_id())?;
            let source = ctx
                .provider
                .fetch_address_utxos(&script_address, None)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| WorkflowError::NotFound("No UTxO at script address".to_string()))?;
            let params = ctx.provider.fetch_protocol_parameters().await?;
            tracing::debug!(utxo = %source.input, "Spending co-sign script output");

            let draft = DraftBuilder::new(ctx.network)
                .spend_native_script(source, script.to_cbor_hex()?)
                .pay_to(recipient.trim(), vec![Asset::lovelace(lovelace)])
                .protocol_parameters(params)
                .change_address(&script_address)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            let partially_signed_tx = wallet.sign_tx(&unsigned, true).await?;

            let record = PendingCosign {
                attempt_id: Uuid::new_v4(),
                partially_signed_tx,
                script_address,
                recipient: recipient.trim().to_string(),
                lovelace,
                first_signer: address,
                created_at_ms: ctx.clock.now_ms(),
            };
            self.store.insert(record.clone())?;
            tracing::info!(attempt_id = %record.attempt_id, "First co-signature recorded");
            Ok(record)
        })
        .await
    }

    /// Second signature and submission of the pending attempt.
    pub async fn step2(
        &self,
        session: &WalletSession,
        attempt_id: &Uuid,
    ) -> WorkflowResult<String> {
        run("multisig_step2", async {
            let op = session.begin()?;
            let wallet = op.wallet();

            self.check_second_signer(wallet).await?;
            let record = self.store.get(attempt_id).ok_or_else(|| {
                WorkflowError::NotFound(format!("no pending co-sign attempt {}", attempt_id))
            })?;

            let tx_hash = sign_and_submit(wallet, &record.partially_signed_tx, true).await?;
            self.forget(attempt_id, &tx_hash);
            tracing::info!(attempt_id = %attempt_id, tx_hash = %tx_hash, "Co-signed transfer submitted");
            Ok(tx_hash)
        })
        .await
    }

    /// Second signature over a partially signed transaction handed over
    /// out of band. A stored record carrying the same transaction is cleared.
    pub async fn step2_from_blob(
        &self,
        session: &WalletSession,
        partially_signed_tx: &str,
    ) -> WorkflowResult<String> {
        run("multisig_step2", async {
            require("partially signed transaction", partially_signed_tx)?;
            let blob = partially_signed_tx.trim();
            let op = session.begin()?;
            let wallet = op.wallet();

            self.check_second_signer(wallet).await?;
            let tx_hash = sign_and_submit(wallet, blob, true).await?;

            let matching: Vec<Uuid> = self
                .store
                .inner
                .iter()
                .filter(|r| r.value().partially_signed_tx == blob)
                .map(|r| *r.key())
                .collect();
            for attempt_id in &matching {
                self.forget(attempt_id, &tx_hash);
            }
            tracing::info!(tx_hash = %tx_hash, cleared = matching.len(), "Co-signed transfer submitted");
            Ok(tx_hash)
        })
        .await
    }

    async fn check_second_signer(&self, wallet: &dyn Wallet) -> WorkflowResult<()> {
        let address = wallet.change_address().await?;
        if address != self.cosigners.second {
            return Err(WorkflowError::WrongSigner {
                expected: self.cosigners.second.clone(),
                actual: address,
            });
        }
        Ok(())
    }

    /// Drop a submitted attempt. The transaction is already on chain, so a
    /// persistence failure here is logged rather than returned.
    fn forget(&self, attempt_id: &Uuid, tx_hash: &str) {
        if let Err(e) = self.store.remove(attempt_id) {
            tracing::error!(
                attempt_id = %attempt_id,
                tx_hash = %tx_hash,
                error = %e,
                "Submitted co-signed transfer but could not clear its record"
            );
        }
    }
}
