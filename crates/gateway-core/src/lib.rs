//! Shared foundation for the session-approval gateway.
//!
//! This crate provides:
//! - GatewayConfig: configuration loading with env overrides
//! - ApiStats: lock-free statistics counters and latency histogram
//! - Correlation-id and event-key helpers
//! - Logging initialization with a runtime-adjustable level

mod config;
mod error;
mod ids;
pub mod logging;
mod stats;

pub use config::{GatewayConfig, DEFAULT_METRICS_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS};
pub use error::{CoreError, CoreResult};
pub use ids::{client_trx_id, event_key, now_micros, parse_key_timestamp};
pub use stats::ApiStats;
