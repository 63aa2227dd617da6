//! Vesting lock and unlock.
//!
//! # Responsibilities
//! - Lock lovelace at the vesting validator with an inline
//!   `(lock_until_ms, owner, beneficiary)` datum
//! - Unlock: decode the datum, classify the connected signer, apply the
//!   beneficiary time gate, and build the spend with validity bounds
//!
//! # Design Decisions
//! - The beneficiary is rejected locally until the unlock time has
//!   passed, and the transaction carries `invalid_before` at the unlock
//!   slot. The owner has no local time check and no lower bound, so an
//!   early reclaim is left for the validator to judge.
//! - A signer matching both roles is treated as the owner
//! - A signer matching neither role is rejected before any signing

use crate::cardano::blueprint::Blueprint;
use crate::cardano::{
    resolve_script, Asset, DatumSource, DraftBuilder, PlutusData, PlutusVersion, ResolvedScript,
};
use crate::config::VestingConfig;
use crate::workflows::amount::{ada_to_lovelace, positive_integer};
use crate::workflows::{payment_key_hash, require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

/// Slots added to the current slot before the validity window.
const UPPER_BOUND_MARGIN_SLOTS: u64 = 90;

const MS_PER_MINUTE: u64 = 60_000;

/// Datum attached to a vesting output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingDatum {
    pub lock_until_ms: u64,
    pub owner: String,
    pub beneficiary: String,
}

impl VestingDatum {
    pub fn to_plutus(&self) -> WorkflowResult<PlutusData> {
        Ok(PlutusData::constr0(vec![
            PlutusData::Int(self.lock_until_ms as i128),
            PlutusData::bytes_hex(&self.owner)?,
            PlutusData::bytes_hex(&self.beneficiary)?,
        ]))
    }

    pub fn from_plutus(data: &PlutusData) -> WorkflowResult<Self> {
        let malformed = || WorkflowError::InvalidInput("malformed vesting datum".to_string());
        let fields = data.constr_fields(0).ok_or_else(malformed)?;
        let [lock_until, owner, beneficiary] = fields else {
            return Err(malformed());
        };
        let lock_until_ms = lock_until
            .as_int()
            .and_then(|i| u64::try_from(i).ok())
            .ok_or_else(malformed)?;
        Ok(Self {
            lock_until_ms,
            owner: hex::encode(owner.as_bytes().ok_or_else(malformed)?),
            beneficiary: hex::encode(beneficiary.as_bytes().ok_or_else(malformed)?),
        })
    }
}

/// Who is unlocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VestingRole {
    Owner,
    Beneficiary,
}

impl VestingDatum {
    /// Role of `signer_pkh`, if any.
    pub fn role_of(&self, signer_pkh: &str) -> Option<VestingRole> {
        if signer_pkh == self.owner {
            Some(VestingRole::Owner)
        } else if signer_pkh == self.beneficiary {
            Some(VestingRole::Beneficiary)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct VestingContract {
    compiled_code: String,
    beneficiary_address: String,
    validity_window_slots: u64,
}

impl VestingContract {
    pub fn new(compiled_code: impl Into<String>, config: &VestingConfig) -> Self {
        Self {
            compiled_code: compiled_code.into(),
            beneficiary_address: config.beneficiary.clone(),
            validity_window_slots: config.validity_window_slots,
        }
    }

    pub fn from_blueprint(blueprint: &Blueprint, config: &VestingConfig) -> WorkflowResult<Self> {
        Ok(Self::new(blueprint.first_validator()?, config))
    }

    fn script(&self, ctx: &ChainContext) -> WorkflowResult<ResolvedScript> {
        Ok(resolve_script(
            ctx.engine.as_ref(),
            &self.compiled_code,
            &[],
            PlutusVersion::V3,
            None,
            ctx.network_id(),
        )?)
    }

    /// Lock `ada` for `lockup_minutes`, beneficiary taken from configuration.
    pub async fn lock(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        ada: &str,
        lockup_minutes: &str,
    ) -> WorkflowResult<String> {
        run("vesting_lock", async {
            let lovelace = ada_to_lovelace(ada)?;
            let minutes = positive_integer("lock-up minutes", lockup_minutes)?;
            let lock_until_ms = minutes
                .checked_mul(MS_PER_MINUTE)
                .and_then(|ms| ms.checked_add(ctx.clock.now_ms()))
                .ok_or_else(|| {
                    WorkflowError::InvalidInput(format!(
                        "lock-up of {} minutes is too long",
                        minutes
                    ))
                })?;
            let beneficiary = payment_key_hash(&self.beneficiary_address)?;
            let op = session.begin()?;
            let wallet = op.wallet();

            let utxos = wallet.utxos().await?;
            let owner_address = wallet.primary_address().await?;
            let datum = VestingDatum {
                lock_until_ms,
                owner: payment_key_hash(&owner_address)?,
                beneficiary,
            };
            let script = self.script(ctx)?;
            tracing::info!(lock_until_ms = datum.lock_until_ms, lovelace, "Locking vesting output");

            let draft = DraftBuilder::new(ctx.network)
                .pay_to_with_inline_datum(
                    &script.address,
                    vec![Asset::lovelace(lovelace)],
                    datum.to_plutus()?,
                )
                .select_from(utxos)
                .change_address(owner_address)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            sign_and_submit(wallet, &unsigned, false).await
        })
        .await
    }

    /// Unlock the vesting output created by `tx_hash`.
    pub async fn unlock(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        tx_hash: &str,
    ) -> WorkflowResult<String> {
        run("vesting_unlock", async {
            require("transaction hash", tx_hash)?;
            let op = session.begin()?;
            let wallet = op.wallet();
            let script = self.script(ctx)?;

            let (locked, datum_hex) = ctx
                .provider
                .fetch_utxos_by_tx(tx_hash.trim())
                .await?
                .into_iter()
                .filter(|u| u.output.address == script.address)
                .find_map(|u| u.output.plutus_data.clone().map(|datum| (u, datum)))
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!("no vesting UTxO for tx {}", tx_hash))
                })?;
            let datum = VestingDatum::from_plutus(&PlutusData::from_cbor_hex(&datum_hex)?)?;

            let signer_address = wallet.primary_address().await?;
            let signer = payment_key_hash(&signer_address)?;
            let role = datum.role_of(&signer).ok_or_else(|| {
                WorkflowError::NotAuthorized(
                    "connected wallet is neither owner nor beneficiary".to_string(),
                )
            })?;

            let now = ctx.clock.now_ms();
            if role == VestingRole::Beneficiary && now <= datum.lock_until_ms {
                return Err(WorkflowError::NotYetUnlockable {
                    lock_until_ms: datum.lock_until_ms,
                });
            }

            let slots = ctx.slot_config();
            let upper = slots.enclosing_slot(now) + UPPER_BOUND_MARGIN_SLOTS + self.validity_window_slots;
            let utxos = wallet.utxos().await?;
            let collateral = wallet.first_collateral().await?;
            tracing::info!(?role, utxo = %locked.input, upper, "Unlocking vesting output");

            let mut builder = DraftBuilder::new(ctx.network)
                .spend_plutus_script(
                    locked,
                    script.script,
                    DatumSource::Inline,
                    PlutusData::constr0(vec![]),
                )
                .invalid_hereafter(upper)
                .required_signer(signer);
            if role == VestingRole::Beneficiary {
                builder = builder.invalid_before(slots.enclosing_slot(datum.lock_until_ms));
            }

            let draft = builder
                .collateral(collateral)
                .select_from(utxos)
                .change_address(signer_address)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            sign_and_submit(wallet, &unsigned, false).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cardano::{Network, SlotConfig};
    use crate::workflows::testing::{key_address, key_hash, utxo, MockEngine, MockProvider, MockWallet};
    use crate::workflows::FixedClock;
    use std::sync::Arc;

    const CODE: &str = "4e4d010000332222200512001200110001";
    const LOCK_UNTIL: u64 = 1_760_000_000_000;

    fn contract() -> VestingContract {
        VestingContract::new(
            CODE,
            &VestingConfig {
                beneficiary: key_address(0xbb, 0x0b),
                ..VestingConfig::default()
            },
        )
    }

    /// Provider holding one vesting output locked by owner 0xaa for beneficiary 0xbb.
    fn provider_with_lock() -> (MockProvider, String) {
        let ctx = ChainContext::new(
            Arc::new(MockProvider::default()),
            Arc::new(MockEngine::default()),
            Network::Preprod,
        );
        let address = contract().script(&ctx).unwrap().address;
        let datum = VestingDatum {
            lock_until_ms: LOCK_UNTIL,
            owner: key_hash(0xaa),
            beneficiary: key_hash(0xbb),
        };
        let tx = hex::encode([0x55; 32]);
        let mut locked = utxo(0x55, 0, &address, 10_000_000);
        locked.output.plutus_data = Some(datum.to_plutus().unwrap().to_cbor_hex().unwrap());
        (MockProvider::default().with_tx_utxos(&tx, vec![locked]), tx)
    }

    fn setup(
        signer: u8,
        now_ms: u64,
    ) -> (Arc<MockWallet>, Arc<MockEngine>, WalletSession, ChainContext, String) {
        let (provider, tx) = provider_with_lock();
        let wallet = Arc::new(MockWallet::new(&key_address(signer, 0x01)));
        let engine = Arc::new(MockEngine::default());
        let session = WalletSession::connected(wallet.clone());
        let ctx = ChainContext::new(Arc::new(provider), engine.clone(), Network::Preprod)
            .with_clock(Arc::new(FixedClock(now_ms)));
        (wallet, engine, session, ctx, tx)
    }

    #[test]
    fn test_datum_roundtrip_through_cbor() {
        let datum = VestingDatum {
            lock_until_ms: LOCK_UNTIL,
            owner: key_hash(1),
            beneficiary: key_hash(2),
        };
        let cbor = datum.to_plutus().unwrap().to_cbor_hex().unwrap();
        let decoded = VestingDatum::from_plutus(&PlutusData::from_cbor_hex(&cbor).unwrap()).unwrap();
        assert_eq!(decoded, datum);
    }

    #[test]
    fn test_malformed_datum() {
        let data = PlutusData::constr0(vec![PlutusData::Int(1)]);
        assert!(VestingDatum::from_plutus(&data).is_err());
    }

    #[tokio::test]
    async fn test_beneficiary_before_unlock_time_fails_locally() {
        let (wallet, engine, session, ctx, tx) = setup(0xbb, LOCK_UNTIL - 60_000);
        let err = contract().unlock(&session, &ctx, &tx).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::NotYetUnlockable { lock_until_ms: LOCK_UNTIL }
        ));
        assert!(err.to_string().contains("Not yet unlockable"));
        assert!(engine.drafts().is_empty());
        assert!(!wallet.signed());
        assert!(!wallet.submitted());
    }

    #[tokio::test]
    async fn test_beneficiary_at_exact_unlock_time_still_locked() {
        let (wallet, _, session, ctx, tx) = setup(0xbb, LOCK_UNTIL);
        let err = contract().unlock(&session, &ctx, &tx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotYetUnlockable { .. }));
        assert!(!wallet.signed());
    }

    #[tokio::test]
    async fn test_beneficiary_after_unlock_time_gets_lower_bound() {
        let now = LOCK_UNTIL + 600_000;
        let (wallet, engine, session, ctx, tx) = setup(0xbb, now);
        contract().unlock(&session, &ctx, &tx).await.unwrap();

        let slots = SlotConfig::for_network(Network::Preprod);
        let draft = engine.last_draft();
        assert_eq!(draft.invalid_before, Some(slots.enclosing_slot(LOCK_UNTIL)));
        assert_eq!(
            draft.invalid_hereafter,
            Some(slots.enclosing_slot(now) + 90 + 86_400)
        );
        assert_eq!(draft.required_signers, vec![key_hash(0xbb)]);
        assert!(wallet.submitted());
    }

    #[tokio::test]
    async fn test_owner_before_unlock_time_builds_transaction() {
        let (wallet, engine, session, ctx, tx) = setup(0xaa, LOCK_UNTIL - 60_000);
        contract().unlock(&session, &ctx, &tx).await.unwrap();

        let draft = engine.last_draft();
        assert_eq!(draft.invalid_before, None);
        assert!(draft.invalid_hereafter.is_some());
        assert_eq!(draft.required_signers, vec![key_hash(0xaa)]);
        assert!(wallet.submitted());
    }

    #[tokio::test]
    async fn test_stranger_is_rejected() {
        let (wallet, engine, session, ctx, tx) = setup(0xcc, LOCK_UNTIL + 1);
        let err = contract().unlock(&session, &ctx, &tx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotAuthorized(_)));
        assert!(engine.drafts().is_empty());
        assert!(!wallet.signed());
    }

    #[tokio::test]
    async fn test_lock_writes_inline_datum() {
        let (wallet, engine, session, ctx, _) = setup(0xaa, 1_700_000_000_000);
        contract().lock(&session, &ctx, "10", "2").await.unwrap();

        let draft = engine.last_draft();
        let crate::cardano::transaction::OutputDatum::Inline(data) = &draft.outputs[0].datum else {
            panic!("expected inline datum");
        };
        let datum = VestingDatum::from_plutus(data).unwrap();
        assert_eq!(datum.lock_until_ms, 1_700_000_000_000 + 120_000);
        assert_eq!(datum.owner, key_hash(0xaa));
        assert_eq!(datum.beneficiary, key_hash(0xbb));
        assert!(wallet.submitted());
    }

    #[tokio::test]
    async fn test_lock_rejects_bad_minutes() {
        let (wallet, _, session, ctx, _) = setup(0xaa, 1_700_000_000_000);
        let err = contract().lock(&session, &ctx, "10", "0").await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_lock_rejects_overflowing_minutes() {
        let (wallet, engine, session, ctx, _) = setup(0xaa, 1_700_000_000_000);
        let err = contract()
            .lock(&session, &ctx, "10", &u64::MAX.to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));

        // Fits in the multiplication but not once added to the current time.
        let minutes = (u64::MAX / MS_PER_MINUTE).to_string();
        let err = contract().lock(&session, &ctx, "10", &minutes).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));

        assert!(wallet.calls().is_empty());
        assert!(engine.drafts().is_empty());
    }

    #[tokio::test]
    async fn test_unlock_skips_script_output_without_datum() {
        let (_, engine, session, ctx, tx) = setup(0xaa, LOCK_UNTIL + 1);
        let address = contract().script(&ctx).unwrap().address;
        let bare = utxo(0x55, 0, &address, 3_000_000);
        let mut locked = utxo(0x55, 1, &address, 10_000_000);
        let datum = VestingDatum {
            lock_until_ms: LOCK_UNTIL,
            owner: key_hash(0xaa),
            beneficiary: key_hash(0xbb),
        };
        locked.output.plutus_data = Some(datum.to_plutus().unwrap().to_cbor_hex().unwrap());
        let provider = MockProvider::default().with_tx_utxos(&tx, vec![bare, locked.clone()]);
        let ctx = ChainContext::new(Arc::new(provider), engine.clone(), Network::Preprod)
            .with_clock(Arc::new(FixedClock(LOCK_UNTIL + 1)));

        contract().unlock(&session, &ctx, &tx).await.unwrap();
        assert_eq!(engine.last_draft().inputs[0].utxo.input, locked.input);
    }
}
