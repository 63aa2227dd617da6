//! Cardano wallet portal library.
//!
//! Wallet-driven transaction workflows (transfers, co-signing, vesting,
//! NFT minting and metadata updates) plus the small account and upload
//! backend that the portal pages talk to.

pub mod accounts;
pub mod api;
pub mod cardano;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pinning;
pub mod workflows;

pub use config::PortalConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
