//! Wallet workflows.
//!
//! # Data Flow
//! ```text
//! user input
//!     → local checks (amount, addresses, signer role, unlock time)
//!     → WalletSession::begin (connected wallet + busy gate)
//!     → wallet / ChainProvider lookups (UTxOs, collateral, datum, parameters)
//!     → DraftBuilder (ordered) → TxDraft
//!     → TxEngine::complete → Wallet::sign_tx → Wallet::submit_tx
//!     → tx hash, or WorkflowError → render_status
//! ```
//!
//! # Design Decisions
//! - Each workflow is a single linear chain of calls: no retries, no
//!   cancellation, no background work
//! - Precondition failures never reach the wallet's signer or the chain
//! - Multisig hand-off records are addressable by attempt id and persisted

pub mod amount;
pub mod context;
pub mod hello_world;
pub mod metadata;
pub mod multisig;
pub mod nft_cip68;
pub mod nft_native;
pub mod nft_plutus;
pub mod nft_update;
pub mod portal;
pub mod session;
pub mod transfer;
pub mod types;
pub mod vesting;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;

pub use context::{ChainContext, Clock, FixedClock, SystemClock};
pub use portal::Portal;
pub use session::{Operation, WalletSession};
pub use types::{render_status, WorkflowError, WorkflowResult};

use crate::cardano::{AddressParts, Wallet};
use crate::observability::metrics;

/// Run a workflow body, recording its outcome.
pub(crate) async fn run<T, F>(workflow: &'static str, body: F) -> WorkflowResult<T>
where
    F: Future<Output = WorkflowResult<T>>,
{
    let result = body.await;
    metrics::record_workflow(workflow, result.is_ok());
    match &result {
        Ok(_) => tracing::info!(workflow, "Workflow completed"),
        Err(e) if e.is_precondition() => tracing::warn!(workflow, error = %e, "Workflow rejected"),
        Err(e) => tracing::error!(workflow, error = %e, "Workflow failed"),
    }
    result
}

/// Payment key hash of an address.
pub(crate) fn payment_key_hash(address: &str) -> WorkflowResult<String> {
    AddressParts::decode(address)
        .map_err(|e| WorkflowError::InvalidInput(format!("invalid address {}: {}", address, e)))?
        .pub_key_hash()
        .ok_or_else(|| {
            WorkflowError::InvalidInput(format!("address {} has no payment key hash", address))
        })
}

/// Reject a malformed destination address before any external call.
pub(crate) fn check_address(field: &str, address: &str) -> WorkflowResult<()> {
    if address.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(format!("{} is required", field)));
    }
    AddressParts::decode(address.trim())
        .map(|_| ())
        .map_err(|e| WorkflowError::InvalidInput(format!("{} is not a valid address: {}", field, e)))
}

/// Reject an empty required text field.
pub(crate) fn require(field: &str, value: &str) -> WorkflowResult<()> {
    if value.trim().is_empty() {
        return Err(WorkflowError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

/// Sign (fully or partially) and submit.
pub(crate) async fn sign_and_submit(
    wallet: &dyn Wallet,
    unsigned_tx: &str,
    partial: bool,
) -> WorkflowResult<String> {
    let signed = wallet.sign_tx(unsigned_tx, partial).await?;
    let tx_hash = wallet.submit_tx(&signed).await?;
    tracing::info!(tx_hash = %tx_hash, "Transaction submitted");
    Ok(tx_hash)
}
