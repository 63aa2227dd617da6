//! IPFS pinning relay.
//!
//! # Data Flow
//! ```text
//! POST /api/upload-to-pinata (multipart "file")  or  CIP-68 mint with image
//!     → PinningService::pin_file(name, content type, bytes)
//!     → PinataClient (multipart POST, bearer credential)
//!     → content id (CID)
//! ```
//!
//! # Design Decisions
//! - The credential lives only in the client and is never logged
//! - One attempt per upload; failures surface to the caller unchanged

pub mod client;

pub use client::{PinataClient, PinningError, PinningResult, PinningService};
