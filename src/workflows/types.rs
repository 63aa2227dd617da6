//! Workflow error definitions and status rendering.

use thiserror::Error;

use crate::cardano::{ChainError, DraftError};
use crate::pinning::PinningError;

/// Errors a workflow can end with.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No wallet is connected to the session.
    #[error("Wallet not connected")]
    NotConnected,

    /// Another operation on the same session is still running.
    #[error("Another operation is in progress")]
    Busy,

    /// User input rejected before any external call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A beneficiary tried to unlock a vesting output before its unlock time.
    #[error("Not yet unlockable: locked until {lock_until_ms} (unix ms)")]
    NotYetUnlockable { lock_until_ms: u64 },

    /// The connected signer is neither owner nor beneficiary.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The connected wallet is not the cosigner expected for this step.
    #[error("Connected wallet {actual} does not match the expected cosigner {expected}")]
    WrongSigner { expected: String, actual: String },

    /// A required UTxO or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Co-signing hand-off storage failed.
    #[error("Hand-off store error: {0}")]
    Handoff(String),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Pinning(#[from] PinningError),
}

impl WorkflowError {
    /// Whether the failure was detected locally, before any chain interaction.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WorkflowError::NotConnected
                | WorkflowError::Busy
                | WorkflowError::InvalidInput(_)
                | WorkflowError::NotYetUnlockable { .. }
                | WorkflowError::NotAuthorized(_)
                | WorkflowError::WrongSigner { .. }
        )
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// One-line user-facing status for a finished action.
pub fn render_status(action: &str, result: &WorkflowResult<String>) -> String {
    match result {
        Ok(tx_hash) => format!("{} succeeded. Tx hash: {}", action, tx_hash),
        Err(e) => format!("{} failed: {}", action, e),
    }
}
