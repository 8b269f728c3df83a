//! Configuration data models
//!
//! This module defines all configuration structures used by the provider router.

pub mod budget;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod provider;
pub mod router;

// Re-export all configuration types
pub use budget::*;
pub use gateway::*;
pub use health::*;
pub use logging::*;
pub use provider::*;
pub use router::*;

use std::time::Duration;

/// Default boolean `true` for serde
pub fn default_true() -> bool {
    true
}

/// Default provider request timeout
pub fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Default maximum retry attempts
pub fn default_max_retries() -> u32 {
    3
}

/// Default provider weight
pub fn default_weight() -> u32 {
    1
}

/// Default requests per minute per provider
pub fn default_rpm() -> Option<u32> {
    Some(60)
}

/// Default concurrent requests per provider
pub fn default_concurrent_requests() -> Option<u32> {
    Some(10)
}

/// Default cost multiplier
pub fn default_cost_multiplier() -> f64 {
    1.0
}

/// Default usage ledger capacity
pub fn default_ledger_capacity() -> usize {
    10_000
}

/// Default log level
pub fn default_log_level() -> String {
    "info".to_string()
}
