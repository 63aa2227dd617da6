//! Plain ADA transfer.

use crate::cardano::{Asset, DraftBuilder};
use crate::workflows::amount::ada_to_lovelace;
use crate::workflows::{check_address, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowResult};

/// Send `ada` to `recipient` from the connected wallet.
pub async fn transfer_ada(
    session: &WalletSession,
    ctx: &ChainContext,
    recipient: &str,
    ada: &str,
) -> WorkflowResult<String> {
    run("transfer", async {
        check_address("recipient", recipient)?;
        let lovelace = ada_to_lovelace(ada)?;
        let op = session.begin()?;
        let wallet = op.wallet();

        let utxos = wallet.utxos().await?;
        let change = wallet.change_address().await?;
        tracing::debug!(recipient, lovelace, "Building transfer");

        let draft = DraftBuilder::new(ctx.network)
            .pay_to(recipient.trim(), vec![Asset::lovelace(lovelace)])
            .select_from(utxos)
            .change_address(change)
            .finalize()?;
        let unsigned = ctx.engine.complete(&draft).await?;
        sign_and_submit(wallet, &unsigned, false).await
    })
    .await
}
