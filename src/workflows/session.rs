//! Wallet session and busy gate.
//!
//! A session is the explicit connection context a page works against:
//! it holds the connected wallet (if any) and ensures only one operation
//! chain runs at a time. Starting an operation returns an RAII guard that
//! releases the gate on drop, on both success and failure paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::cardano::Wallet;
use crate::workflows::types::{WorkflowError, WorkflowResult};

#[derive(Default)]
pub struct WalletSession {
    wallet: RwLock<Option<Arc<dyn Wallet>>>,
    busy: AtomicBool,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already connected to `wallet`.
    pub fn connected(wallet: Arc<dyn Wallet>) -> Self {
        let session = Self::new();
        session.connect(wallet);
        session
    }

    pub fn connect(&self, wallet: Arc<dyn Wallet>) {
        let mut slot = self.wallet.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(wallet);
        tracing::info!("Wallet connected");
    }

    pub fn disconnect(&self) {
        let mut slot = self.wallet.write().unwrap_or_else(|p| p.into_inner());
        *slot = None;
        tracing::info!("Wallet disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.wallet
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The connected wallet.
    pub fn wallet(&self) -> WorkflowResult<Arc<dyn Wallet>> {
        self.wallet
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or(WorkflowError::NotConnected)
    }

    /// Start an operation: requires a connected wallet and an idle session.
    pub fn begin(&self) -> WorkflowResult<Operation<'_>> {
        let wallet = self.wallet()?;
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WorkflowError::Busy);
        }
        Ok(Operation {
            wallet,
            busy: &self.busy,
        })
    }
}

/// An in-flight operation. Holds the busy gate until dropped.
pub struct Operation<'a> {
    wallet: Arc<dyn Wallet>,
    busy: &'a AtomicBool,
}

impl Operation<'_> {
    pub fn wallet(&self) -> &dyn Wallet {
        self.wallet.as_ref()
    }
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
