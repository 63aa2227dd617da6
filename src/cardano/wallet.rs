//! Wallet capability.
//!
//! # Security
//! - Keys never leave the wallet; this crate only sees addresses,
//!   UTxOs and transaction CBOR
//! - Partial signing adds the wallet's witness without requiring that
//!   the transaction be fully witnessed

use async_trait::async_trait;

use crate::cardano::types::{Asset, ChainError, ChainResult, Utxo};

/// A connected wallet, as exposed by a CIP-30 style provider.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn change_address(&self) -> ChainResult<String>;

    async fn used_addresses(&self) -> ChainResult<Vec<String>>;

    /// Spendable UTxOs.
    async fn utxos(&self) -> ChainResult<Vec<Utxo>>;

    /// UTxOs the wallet has set aside as collateral.
    async fn collateral(&self) -> ChainResult<Vec<Utxo>>;

    /// Assets held across all UTxOs.
    async fn assets(&self) -> ChainResult<Vec<Asset>>;

    /// Sign `tx_cbor`. With `partial`, missing witnesses from other
    /// parties are tolerated.
    async fn sign_tx(&self, tx_cbor: &str, partial: bool) -> ChainResult<String>;

    /// Submit a signed transaction, returning its hash.
    async fn submit_tx(&self, signed_tx: &str) -> ChainResult<String>;

    /// First used address, falling back to the change address for a
    /// wallet that has never transacted.
    async fn primary_address(&self) -> ChainResult<String> {
        match self.used_addresses().await?.into_iter().next() {
            Some(address) => Ok(address),
            None => self.change_address().await,
        }
    }

    /// First collateral UTxO.
    async fn first_collateral(&self) -> ChainResult<Utxo> {
        self.collateral()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ChainError::Wallet("No collateral found. Set up collateral in the wallet.".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FreshWallet;

    #[async_trait]
    impl Wallet for FreshWallet {
        async fn change_address(&self) -> ChainResult<String> {
            Ok("addr_test1change".to_string())
        }
        async fn used_addresses(&self) -> ChainResult<Vec<String>> {
            Ok(Vec::new())
        }
        async fn utxos(&self) -> ChainResult<Vec<Utxo>> {
            Ok(Vec::new())
        }
        async fn collateral(&self) -> ChainResult<Vec<Utxo>> {
            Ok(Vec::new())
        }
        async fn assets(&self) -> ChainResult<Vec<Asset>> {
            Ok(Vec::new())
        }
        async fn sign_tx(&self, tx_cbor: &str, _partial: bool) -> ChainResult<String> {
            Ok(tx_cbor.to_string())
        }
        async fn submit_tx(&self, _signed_tx: &str) -> ChainResult<String> {
            Ok("hash".to_string())
        }
    }

    #[tokio::test]
    async fn test_primary_address_falls_back_to_change() {
        assert_eq!(FreshWallet.primary_address().await.unwrap(), "addr_test1change");
    }

    #[tokio::test]
    async fn test_missing_collateral() {
        let err = FreshWallet.first_collateral().await.unwrap_err();
        assert!(err.to_string().contains("No collateral found"));
    }
}
