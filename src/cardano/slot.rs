//! Wall-clock to slot conversion.

use crate::cardano::types::Network;

/// Shelley-era slot parameters for a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConfig {
    /// Unix time (ms) at `zero_slot`.
    pub zero_time_ms: u64,
    pub zero_slot: u64,
    /// Slot length in milliseconds.
    pub slot_length_ms: u64,
}

impl SlotConfig {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self {
                zero_time_ms: 1_596_059_091_000,
                zero_slot: 4_492_800,
                slot_length_ms: 1000,
            },
            Network::Preprod => Self {
                zero_time_ms: 1_655_769_600_000,
                zero_slot: 86_400,
                slot_length_ms: 1000,
            },
            Network::Preview => Self {
                zero_time_ms: 1_666_656_000_000,
                zero_slot: 0,
                slot_length_ms: 1000,
            },
        }
    }

    /// Slot containing `unix_ms`. Times before the era start clamp to `zero_slot`.
    pub fn enclosing_slot(&self, unix_ms: u64) -> u64 {
        let elapsed = unix_ms.saturating_sub(self.zero_time_ms);
        elapsed / self.slot_length_ms + self.zero_slot
    }

    /// Unix time (ms) at which `slot` begins.
    pub fn slot_to_unix_ms(&self, slot: u64) -> u64 {
        self.zero_time_ms + slot.saturating_sub(self.zero_slot) * self.slot_length_ms
    }
}
