//! Shelley address decoding and encoding.
//!
//! Workflows need three things from an address: the payment key hash (to
//! name a signer), the payment script hash, and the stake credential (the
//! CIP-68 store address reuses the exchange's stake key). Key derivation is
//! never done here; the wallet owns keys.

use bech32::{Bech32, Hrp};
use thiserror::Error;

/// Length of key and script hashes (Blake2b-224).
pub const HASH_LEN: usize = 28;

/// Errors produced while decoding or encoding addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid bech32: {0}")]
    Bech32(String),

    #[error("unexpected prefix '{0}'")]
    Prefix(String),

    #[error("unsupported address type {0}")]
    UnsupportedType(u8),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("network id {header} in header does not match prefix '{prefix}'")]
    NetworkMismatch { header: u8, prefix: String },

    #[error("invalid hash hex: {0}")]
    Hex(String),
}

/// A payment or stake credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    Key([u8; HASH_LEN]),
    Script([u8; HASH_LEN]),
}

impl Credential {
    pub fn hash(&self) -> &[u8; HASH_LEN] {
        match self {
            Credential::Key(h) | Credential::Script(h) => h,
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash())
    }

    fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }
}

/// Decoded view of a Shelley payment address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParts {
    pub network_id: u8,
    pub payment: Credential,
    /// Present for base addresses; pointer and enterprise addresses have none.
    pub stake: Option<Credential>,
}

impl AddressParts {
    /// Decode a bech32 `addr`/`addr_test` string.
    pub fn decode(address: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(address).map_err(|e| AddressError::Bech32(e.to_string()))?;
        let prefix = hrp.to_string();
        let expected_network = match prefix.as_str() {
            "addr" => 1,
            "addr_test" => 0,
            _ => return Err(AddressError::Prefix(prefix)),
        };

        let header = *data.first().ok_or(AddressError::Length {
            expected: 1 + HASH_LEN,
            actual: 0,
        })?;
        let addr_type = header >> 4;
        let network_id = header & 0x0f;
        if network_id != expected_network {
            return Err(AddressError::NetworkMismatch {
                header: network_id,
                prefix,
            });
        }

        let payment_bytes = read_hash(&data, 1)?;
        let payment = match addr_type {
            0 | 2 | 4 | 6 => Credential::Key(payment_bytes),
            1 | 3 | 5 | 7 => Credential::Script(payment_bytes),
            other => return Err(AddressError::UnsupportedType(other)),
        };

        let stake = match addr_type {
            0..=3 => {
                if data.len() != 1 + 2 * HASH_LEN {
                    return Err(AddressError::Length {
                        expected: 1 + 2 * HASH_LEN,
                        actual: data.len(),
                    });
                }
                let stake_bytes = read_hash(&data, 1 + HASH_LEN)?;
                Some(if addr_type == 0 || addr_type == 1 {
                    Credential::Key(stake_bytes)
                } else {
                    Credential::Script(stake_bytes)
                })
            }
            6 | 7 => {
                if data.len() != 1 + HASH_LEN {
                    return Err(AddressError::Length {
                        expected: 1 + HASH_LEN,
                        actual: data.len(),
                    });
                }
                None
            }
            // Pointer addresses: the variable-length pointer is not needed.
            _ => None,
        };

        Ok(Self {
            network_id,
            payment,
            stake,
        })
    }

    /// Enterprise address paying to a key hash.
    pub fn enterprise(payment: Credential, network_id: u8) -> Self {
        Self {
            network_id,
            payment,
            stake: None,
        }
    }

    /// Encode back to bech32. Pointer addresses cannot be re-encoded and
    /// are never produced by `decode` with their pointer intact.
    pub fn encode(&self) -> Result<String, AddressError> {
        let addr_type: u8 = match (self.payment.is_script(), self.stake) {
            (false, Some(Credential::Key(_))) => 0,
            (true, Some(Credential::Key(_))) => 1,
            (false, Some(Credential::Script(_))) => 2,
            (true, Some(Credential::Script(_))) => 3,
            (false, None) => 6,
            (true, None) => 7,
        };

        let mut bytes = Vec::with_capacity(1 + 2 * HASH_LEN);
        bytes.push((addr_type << 4) | (self.network_id & 0x0f));
        bytes.extend_from_slice(self.payment.hash());
        if let Some(stake) = &self.stake {
            bytes.extend_from_slice(stake.hash());
        }

        let prefix = if self.network_id == 1 { "addr" } else { "addr_test" };
        let hrp = Hrp::parse(prefix).map_err(|e| AddressError::Bech32(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &bytes).map_err(|e| AddressError::Bech32(e.to_string()))
    }

    /// Payment key hash as hex, when the payment part is a key.
    pub fn pub_key_hash(&self) -> Option<String> {
        match self.payment {
            Credential::Key(h) => Some(hex::encode(h)),
            Credential::Script(_) => None,
        }
    }

    /// Payment script hash as hex, when the payment part is a script.
    pub fn script_hash(&self) -> Option<String> {
        match self.payment {
            Credential::Script(h) => Some(hex::encode(h)),
            Credential::Key(_) => None,
        }
    }

    /// Stake credential hash as hex, key or script.
    pub fn stake_credential_hash(&self) -> Option<String> {
        self.stake.as_ref().map(Credential::to_hex)
    }
}

/// Parse a 28-byte hash from hex.
pub fn hash_from_hex(value: &str) -> Result<[u8; HASH_LEN], AddressError> {
    let bytes = hex::decode(value).map_err(|e| AddressError::Hex(e.to_string()))?;
    bytes.as_slice().try_into().map_err(|_| AddressError::Length {
        expected: HASH_LEN,
        actual: bytes.len(),
    })
}

/// Address of a script, optionally delegating to a stake credential.
pub fn script_address(
    script_hash: &str,
    stake: Option<Credential>,
    network_id: u8,
) -> Result<String, AddressError> {
    AddressParts {
        network_id,
        payment: Credential::Script(hash_from_hex(script_hash)?),
        stake,
    }
    .encode()
}

fn read_hash(data: &[u8], offset: usize) -> Result<[u8; HASH_LEN], AddressError> {
    data.get(offset..offset + HASH_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or(AddressError::Length {
            expected: offset + HASH_LEN,
            actual: data.len(),
        })
}
