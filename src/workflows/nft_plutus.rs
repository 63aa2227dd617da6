//! CIP-25 one-shot mint under a Plutus policy.
//!
//! # Responsibilities
//! - Capture the wallet's first UTxO as the policy parameter (`prepare`)
//! - Mint exactly one token, consuming that UTxO so the policy can never
//!   mint again (`mint`)
//!
//! # Design Decisions
//! - The policy id is a pure function of the validator and the captured
//!   output reference, so it is known before minting
//! - A captured UTxO that has since left the wallet is reported locally
//!   instead of letting the validator reject the transaction

use crate::cardano::blueprint::Blueprint;
use crate::cardano::{
    resolve_script, DraftBuilder, PlutusData, PlutusVersion, ResolvedScript, Utxo,
};
use crate::workflows::metadata::{asset_name_hex, cip25_metadata, Cip25Fields, CIP25_LABEL};
use crate::workflows::{require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

/// Blueprint title of the one-shot minting policy.
pub const ONE_SHOT_VALIDATOR: &str = "nft.one_shot_mint.mint";

const MEDIA_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Default)]
pub struct OneShotMintRequest {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl OneShotMintRequest {
    fn validate(&self) -> WorkflowResult<()> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        require("image", &self.image)?;
        if !self.image.trim().starts_with("ipfs://") {
            return Err(WorkflowError::InvalidInput(
                "image link must start with 'ipfs://'".to_string(),
            ));
        }
        Ok(())
    }
}

/// A policy bound to one wallet output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneShotPlan {
    pub fixed_utxo: Utxo,
}

impl OneShotPlan {
    /// `Constr0[tx_hash, output_index]`
    fn parameter(&self) -> WorkflowResult<PlutusData> {
        Ok(PlutusData::constr0(vec![
            PlutusData::bytes_hex(&self.fixed_utxo.input.tx_hash)?,
            PlutusData::Int(self.fixed_utxo.input.output_index as i128),
        ]))
    }
}

#[derive(Debug, Clone)]
pub struct OneShotContract {
    compiled_code: String,
}

impl OneShotContract {
    pub fn new(compiled_code: impl Into<String>) -> Self {
        Self {
            compiled_code: compiled_code.into(),
        }
    }

    pub fn from_blueprint(blueprint: &Blueprint) -> WorkflowResult<Self> {
        Ok(Self::new(blueprint.validator(ONE_SHOT_VALIDATOR)?))
    }

    fn policy(&self, ctx: &ChainContext, plan: &OneShotPlan) -> WorkflowResult<ResolvedScript> {
        Ok(resolve_script(
            ctx.engine.as_ref(),
            &self.compiled_code,
            &[plan.parameter()?],
            PlutusVersion::V3,
            None,
            ctx.network_id(),
        )?)
    }

    /// Policy id the plan mints under.
    pub fn policy_id(&self, ctx: &ChainContext, plan: &OneShotPlan) -> WorkflowResult<String> {
        Ok(self.policy(ctx, plan)?.hash)
    }

    /// Capture the connected wallet's first UTxO.
    pub async fn prepare(&self, session: &WalletSession) -> WorkflowResult<OneShotPlan> {
        let wallet = session.wallet()?;
        let fixed_utxo = wallet
            .utxos()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WorkflowError::NotFound("wallet has no UTxO to fix the policy".to_string()))?;
        tracing::debug!(utxo = %fixed_utxo.input, "Captured one-shot UTxO");
        Ok(OneShotPlan { fixed_utxo })
    }

    /// Mint the single token of `plan`.
    pub async fn mint(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        plan: &OneShotPlan,
        request: &OneShotMintRequest,
    ) -> WorkflowResult<String> {
        run("nft_plutus_mint", async {
            request.validate()?;
            let op = session.begin()?;
            let wallet = op.wallet();

            let utxos = wallet.utxos().await?;
            if !utxos.iter().any(|u| u.input == plan.fixed_utxo.input) {
                return Err(WorkflowError::NotFound(format!(
                    "UTxO {} has already been spent; this policy can no longer mint",
                    plan.fixed_utxo.input
                )));
            }
            let change = wallet.change_address().await?;
            let collateral = wallet.first_collateral().await?;
            let policy = self.policy(ctx, plan)?;
            let name = request.name.trim();
            let metadata = cip25_metadata(
                &policy.hash,
                &Cip25Fields {
                    name: name.to_string(),
                    image: request.image.trim().to_string(),
                    description: request.description.trim().to_string(),
                    media_type: MEDIA_TYPE.to_string(),
                },
            );
            tracing::info!(policy_id = %policy.hash, name, "Minting one-shot NFT");

            let draft = DraftBuilder::new(ctx.network)
                .mint_plutus(
                    1,
                    &policy.hash,
                    asset_name_hex(name),
                    policy.script,
                    PlutusData::constr0(vec![]),
                )
                .spend(plan.fixed_utxo.clone())
                .metadata(CIP25_LABEL, metadata)
                .collateral(collateral)
                .select_from(utxos)
                .change_address(change)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            sign_and_submit(wallet, &unsigned, true).await
        })
        .await
    }
}
