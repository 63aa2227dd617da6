//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, fees > 0)
//! - Check that configured addresses decode and that cosigners differ
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PortalConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::cardano::address::AddressParts;
use crate::cardano::types::Network;
use crate::config::schema::PortalConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    BadSocketAddr { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: unknown network '{value}'")]
    UnknownNetwork { field: &'static str, value: String },

    #[error("{field}: {reason}")]
    BadAddress { field: &'static str, reason: String },

    #[error("multisig: first and second cosigner must be different addresses")]
    SameCosigner,
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &PortalConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadSocketAddr {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadSocketAddr {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positives: [(&'static str, u64); 6] = [
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("server.max_body_size", config.server.max_body_size as u64),
        ("auth.token_ttl_secs", config.auth.token_ttl_secs),
        ("pinning.timeout_secs", config.pinning.timeout_secs),
        ("chain.timeout_secs", config.chain.timeout_secs),
        ("nft.platform_fee_lovelace", config.nft.platform_fee_lovelace),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "database.max_connections" });
    }

    if config.chain.network.parse::<Network>().is_err() {
        errors.push(ValidationError::UnknownNetwork {
            field: "chain.network",
            value: config.chain.network.clone(),
        });
    }

    let addresses = [
        ("multisig.first_cosigner", &config.multisig.first_cosigner),
        ("multisig.second_cosigner", &config.multisig.second_cosigner),
        ("vesting.beneficiary", &config.vesting.beneficiary),
        ("nft.exchange_address", &config.nft.exchange_address),
    ];
    for (field, value) in addresses {
        if let Err(e) = AddressParts::decode(value) {
            errors.push(ValidationError::BadAddress {
                field,
                reason: e.to_string(),
            });
        }
    }

    if config.multisig.first_cosigner == config.multisig.second_cosigner {
        errors.push(ValidationError::SameCosigner);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
