//! Provider health tracking
//!
//! # Module Structure
//!
//! - `types` - Health status and probe results
//! - `provider` - Per-provider health state and pool summary
//! - `checker` - Reachability probes
//! - `monitor` - Background probe loop
//! - `tests` - Test suite for health monitoring

pub mod checker;
pub mod monitor;
pub mod provider;
pub mod types;

pub use checker::{HealthProbe, HttpProbe};
pub use monitor::HealthMonitor;
pub use provider::{HealthState, SystemHealth};
pub use types::{HealthCheckResult, HealthStatus};
