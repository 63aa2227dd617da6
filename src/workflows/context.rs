//! Shared collaborators for workflows.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cardano::{ChainProvider, Network, SlotConfig, TxEngine};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

/// Chain provider, transaction engine, network and clock.
#[derive(Clone)]
pub struct ChainContext {
    pub provider: Arc<dyn ChainProvider>,
    pub engine: Arc<dyn TxEngine>,
    pub network: Network,
    pub clock: Arc<dyn Clock>,
}

impl ChainContext {
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        engine: Arc<dyn TxEngine>,
        network: Network,
    ) -> Self {
        Self {
            provider,
            engine,
            network,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn slot_config(&self) -> SlotConfig {
        SlotConfig::for_network(self.network)
    }

    pub fn network_id(&self) -> u8 {
        self.network.network_id()
    }
}
