//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the portal.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the portal.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PortalConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// User database settings.
    pub database: DatabaseConfig,

    /// Token issuance settings.
    pub auth: AuthConfig,

    /// IPFS pinning relay settings.
    pub pinning: PinningConfig,

    /// Chain data provider settings.
    pub chain: ChainConfig,

    /// Two-party co-signing settings.
    pub multisig: MultisigConfig,

    /// Vesting contract settings.
    pub vesting: VestingConfig,

    /// NFT minting settings.
    pub nft: NftConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum body size in bytes (bounds the upload relay).
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Relational user store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string. Usually supplied through `DATABASE_URL`.
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Seconds to wait for a free connection before failing the request.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret. Usually supplied through `JWT_SECRET`.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
        }
    }
}

/// File-pinning service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PinningConfig {
    /// Pinning endpoint that accepts multipart uploads.
    pub api_url: String,

    /// Bearer credential. Usually supplied through `PINATA_JWT`.
    #[serde(skip_serializing)]
    pub jwt: String,

    /// Upload timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.pinata.cloud/pinning/pinFileToIPFS".to_string(),
            jwt: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Chain data provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Network name: "mainnet", "preprod" or "preview".
    pub network: String,

    /// Blockfrost-compatible REST endpoint.
    pub provider_url: String,

    /// Provider project id. Usually supplied through `BLOCKFROST_PROJECT_ID`.
    #[serde(skip_serializing)]
    pub project_id: String,

    /// Provider request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: "preprod".to_string(),
            provider_url: "https://cardano-preprod.blockfrost.io/api/v0".to_string(),
            project_id: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Two-party co-signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MultisigConfig {
    /// Address expected to perform the first (partial) signature.
    pub first_cosigner: String,

    /// Address expected to add the second signature and submit.
    pub second_cosigner: String,

    /// Optional JSON file that persists pending hand-off records.
    pub handoff_path: Option<String>,
}

impl Default for MultisigConfig {
    fn default() -> Self {
        Self {
            first_cosigner: "addr_test1qrn4fuvpnrhttvwuq5z0733aa9tk82pjqg9rlzva9n7t04ra0a8k5yqyw3583j9ah206l94kxqfr50asuqqesw39x65st8lzp8".to_string(),
            second_cosigner: "addr_test1qpwm26gaq0zk7a43dte25msfan5jvy6c3gpr9qennesrkkxvywm3xn8zjjwmg6el4hwda8x4y6c368j5839d8vfrwj3qv44pnn".to_string(),
            handoff_path: None,
        }
    }
}

/// Vesting contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VestingConfig {
    /// Address whose key hash is recorded as the beneficiary at lock time.
    pub beneficiary: String,

    /// Blueprint holding the vesting validator.
    pub blueprint_path: String,

    /// Slots added to the current slot for the upper validity bound.
    pub validity_window_slots: u64,
}

impl Default for VestingConfig {
    fn default() -> Self {
        Self {
            beneficiary: "addr_test1qp86eqd482yd8pacaalewzw7zcjtmvfjjqyhndjm63pdsxqshq0ck5lz8jmcnsgkd39tgh7c2tsf6vd0pxc6w2wlth6q9hu0h9".to_string(),
            blueprint_path: "contracts/vesting/plutus.json".to_string(),
            validity_window_slots: 86_400,
        }
    }
}

/// NFT minting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NftConfig {
    /// Exchange address receiving the platform fee; its key and stake
    /// credentials parameterize the CIP-68 store and mint validators.
    pub exchange_address: String,

    /// Platform fee in lovelace.
    pub platform_fee_lovelace: u64,

    /// Blueprint holding the one-shot mint validator.
    pub one_shot_blueprint_path: String,

    /// Blueprint holding the CIP-68 mint and store validators.
    pub cip68_blueprint_path: String,

    /// Blueprint holding the hello-world lock validator.
    pub hello_world_blueprint_path: String,
}

impl Default for NftConfig {
    fn default() -> Self {
        Self {
            exchange_address: "addr_test1qzzdhw4rp6aw2fnwdt4kyqa28u63l36t5246s6u9z9g2g38u5ng72qq828yvhzxn5qlz2e2u9u0u2lc053ljc5lg5pwq7ev63j".to_string(),
            platform_fee_lovelace: 1_000_000,
            one_shot_blueprint_path: "contracts/nft/plutus.json".to_string(),
            cip68_blueprint_path: "contracts/nftcip68/plutus.json".to_string(),
            hello_world_blueprint_path: "contracts/helloworld/plutus.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error or a full directive).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "cardano_portal=debug,tower_http=debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.chain.network, "preprod");
        assert_eq!(config.nft.platform_fee_lovelace, 1_000_000);
        assert!(config.multisig.handoff_path.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: PortalConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:4000"

            [chain]
            network = "preview"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:4000");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.chain.network, "preview");
        assert_eq!(config.vesting.validity_window_slots, 86_400);
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = PortalConfig::default();
        config.auth.jwt_secret = "super-secret".to_string();
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("super-secret"));
    }
}
