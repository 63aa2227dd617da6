//! CIP-25 mint under a one-signature native policy.

use crate::cardano::{DraftBuilder, NativeScript};
use crate::workflows::amount::positive_integer;
use crate::workflows::metadata::{asset_name_hex, cip25_metadata, Cip25Fields, CIP25_LABEL};
use crate::workflows::{require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

const MEDIA_TYPE: &str = "image/jpg";

/// User input for a native-policy mint.
#[derive(Debug, Clone, Default)]
pub struct NativeMintRequest {
    pub name: String,
    pub description: String,
    /// `ipfs://` link to the image.
    pub image: String,
    pub quantity: String,
}

impl NativeMintRequest {
    fn validate(&self) -> WorkflowResult<u64> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        require("image", &self.image)?;
        if !self.image.trim().starts_with("ipfs://") {
            return Err(WorkflowError::InvalidInput(
                "image link must start with 'ipfs://'".to_string(),
            ));
        }
        positive_integer("quantity", &self.quantity)
    }
}

/// Mint `quantity` tokens named `name` with label-721 metadata.
///
/// The policy requires the signature of the wallet's change address, so
/// the same wallet always mints under the same policy id.
pub async fn mint_native(
    session: &WalletSession,
    ctx: &ChainContext,
    request: &NativeMintRequest,
) -> WorkflowResult<String> {
    run("nft_native_mint", async {
        let quantity = request.validate()?;
        let quantity = i64::try_from(quantity)
            .map_err(|_| WorkflowError::InvalidInput("quantity is too large".to_string()))?;
        let op = session.begin()?;
        let wallet = op.wallet();

        let utxos = wallet.utxos().await?;
        let change = wallet.change_address().await?;
        let policy = NativeScript::with_one_signature(&change)?;
        let policy_id = policy.hash()?;
        let name = request.name.trim();
        let metadata = cip25_metadata(
            &policy_id,
            &Cip25Fields {
                name: name.to_string(),
                image: request.image.trim().to_string(),
                description: request.description.trim().to_string(),
                media_type: MEDIA_TYPE.to_string(),
            },
        );
        tracing::info!(policy_id = %policy_id, name, quantity, "Minting native-policy NFT");

        let draft = DraftBuilder::new(ctx.network)
            .mint_native(quantity, &policy_id, asset_name_hex(name), policy.to_cbor_hex()?)
            .metadata(CIP25_LABEL, metadata)
            .select_from(utxos)
            .change_address(change)
            .finalize()?;
        let unsigned = ctx.engine.complete(&draft).await?;
        sign_and_submit(wallet, &unsigned, false).await
    })
    .await
}
