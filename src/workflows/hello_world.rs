//! Single lock/unlock against the hello-world validator.
//!
//! Lock pays lovelace to the validator with the owner's key hash attached
//! as a datum hash. Unlock spends that output back with the message
//! redeemer, supplying the datum value, the owner as required signer and
//! collateral.

use crate::cardano::blueprint::Blueprint;
use crate::cardano::{
    resolve_script, Asset, DatumSource, DraftBuilder, PlutusData, PlutusVersion, ResolvedScript,
};
use crate::workflows::amount::ada_to_lovelace;
use crate::workflows::{payment_key_hash, require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

/// Message the validator expects in the redeemer.
pub const UNLOCK_MESSAGE: &str = "Hello, World!";

#[derive(Debug, Clone)]
pub struct HelloWorldContract {
    compiled_code: String,
}

impl HelloWorldContract {
    pub fn new(compiled_code: impl Into<String>) -> Self {
        Self {
            compiled_code: compiled_code.into(),
        }
    }

    pub fn from_blueprint(blueprint: &Blueprint) -> WorkflowResult<Self> {
        Ok(Self::new(blueprint.first_validator()?))
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

    fn owner_datum(owner_pkh: &str) -> WorkflowResult<PlutusData> {
        Ok(PlutusData::constr0(vec![PlutusData::bytes_hex(owner_pkh)?]))
    }

    /// Lock `ada` at the validator.
    pub async fn lock(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        ada: &str,
    ) -> WorkflowResult<String> {
        run("hello_world_lock", async {
            let lovelace = ada_to_lovelace(ada)?;
            let op = session.begin()?;
            let wallet = op.wallet();

            let utxos = wallet.utxos().await?;
            let owner = wallet.primary_address().await?;
            let owner_pkh = payment_key_hash(&owner)?;
            let script = self.script(ctx)?;

            let draft = DraftBuilder::new(ctx.network)
                .pay_to_with_datum_hash(
                    &script.address,
                    vec![Asset::lovelace(lovelace)],
                    Self::owner_datum(&owner_pkh)?,
                )
                .select_from(utxos)
                .change_address(owner)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            sign_and_submit(wallet, &unsigned, false).await
        })
        .await
    }

    /// Unlock the output locked by transaction `tx_hash`.
    pub async fn unlock(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        tx_hash: &str,
    ) -> WorkflowResult<String> {
        run("hello_world_unlock", async {
            require("transaction hash", tx_hash)?;
            let op = session.begin()?;
            let wallet = op.wallet();
            let script = self.script(ctx)?;

            let locked = ctx
                .provider
                .fetch_utxos_by_tx(tx_hash.trim())
                .await?
                .into_iter()
                .find(|u| u.output.address == script.address)
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!("no UTxO at the validator for tx {}", tx_hash))
                })?;

            let utxos = wallet.utxos().await?;
            let owner = wallet.primary_address().await?;
            let collateral = wallet.first_collateral().await?;
            let owner_pkh = payment_key_hash(&owner)?;
            tracing::debug!(utxo = %locked.input, "Unlocking hello-world output");

            let draft = DraftBuilder::new(ctx.network)
                .spend_plutus_script(
                    locked,
                    script.script,
                    DatumSource::Value(Self::owner_datum(&owner_pkh)?),
                    PlutusData::constr0(vec![PlutusData::utf8(UNLOCK_MESSAGE)]),
                )
                .required_signer(owner_pkh)
                .collateral(collateral)
                .select_from(utxos)
                .change_address(owner)
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
    use crate::cardano::transaction::{InputWitness, OutputDatum};
    use crate::cardano::Network;
    use crate::workflows::testing::{key_address, key_hash, utxo, MockEngine, MockProvider, MockWallet};
    use std::sync::Arc;

    const CODE: &str = "4e4d01000033222220051200120011";

    fn script_address() -> String {
        let ctx = ChainContext::new(
            Arc::new(MockProvider::default()),
            Arc::new(MockEngine::default()),
            Network::Preprod,
        );
        HelloWorldContract::new(CODE).script(&ctx).unwrap().address
    }

    #[tokio::test]
    async fn test_lock_attaches_owner_datum_hash() {
        let engine = Arc::new(MockEngine::default());
        let wallet = Arc::new(MockWallet::new(&key_address(1, 2)));
        let session = WalletSession::connected(wallet.clone());
        let ctx = ChainContext::new(Arc::new(MockProvider::default()), engine.clone(), Network::Preprod);

        HelloWorldContract::new(CODE).lock(&session, &ctx, "10").await.unwrap();

        let draft = engine.last_draft();
        assert_eq!(draft.outputs[0].address, script_address());
        assert_eq!(
            draft.outputs[0].datum,
            OutputDatum::Hash(PlutusData::constr0(vec![PlutusData::Bytes(vec![1; 28])]))
        );
        assert!(wallet.submitted());
    }

    #[tokio::test]
    async fn test_unlock_spends_with_message() {
        let engine = Arc::new(MockEngine::default());
        let address = script_address();
        let tx = hex::encode([0x33; 32]);
        let provider = MockProvider::default().with_tx_utxos(
            &tx,
            vec![utxo(0x44, 0, &key_address(9, 9), 1_000_000), {
                let mut u = utxo(0x33, 1, &address, 10_000_000);
                u.input.tx_hash = tx.clone();
                u
            }],
        );
        let wallet = Arc::new(MockWallet::new(&key_address(1, 2)));
        let session = WalletSession::connected(wallet.clone());
        let ctx = ChainContext::new(Arc::new(provider), engine.clone(), Network::Preprod);

        HelloWorldContract::new(CODE).unlock(&session, &ctx, &tx).await.unwrap();

        let draft = engine.last_draft();
        assert_eq!(draft.inputs.len(), 1);
        assert_eq!(draft.inputs[0].utxo.input.output_index, 1);
        let InputWitness::Plutus { redeemer, .. } = &draft.inputs[0].witness else {
            panic!("expected plutus witness");
        };
        assert_eq!(
            redeemer,
            &PlutusData::constr0(vec![PlutusData::utf8("Hello, World!")])
        );
        assert_eq!(draft.required_signers, vec![key_hash(1)]);
        assert!(draft.collateral.is_some());
    }

    #[tokio::test]
    async fn test_unlock_unknown_tx() {
        let wallet = Arc::new(MockWallet::new(&key_address(1, 2)));
        let session = WalletSession::connected(wallet.clone());
        let ctx = ChainContext::new(
            Arc::new(MockProvider::default()),
            Arc::new(MockEngine::default()),
            Network::Preprod,
        );
        let err = HelloWorldContract::new(CODE)
            .unlock(&session, &ctx, "ab")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
        assert!(!wallet.signed());
    }
}
