//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! api handlers, workflows, chain provider:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ids come from the http layer and appear on every span
//! - Metrics are cheap facade calls, so recording is unconditional

pub mod logging;
pub mod metrics;
