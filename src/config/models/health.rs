//! Health monitoring configuration

use super::*;
use crate::utils::error::duration_secs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Whether periodic probing runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval between probe rounds, in seconds
    #[serde(default = "default_check_interval", with = "duration_secs")]
    pub check_interval: Duration,
    /// Timeout for an individual probe, in seconds
    #[serde(default = "default_check_timeout", with = "duration_secs")]
    pub check_timeout: Duration,
    /// Consecutive probe failures above which a provider is Unhealthy
    #[serde(default = "default_probe_failure_threshold")]
    pub probe_failure_threshold: u32,
    /// Consecutive call failures above which a provider is Unhealthy
    #[serde(default = "default_unhealthy_consecutive_failures")]
    pub unhealthy_consecutive_failures: u32,
    /// Error rate above which a provider is Degraded
    #[serde(default = "default_degraded_error_rate")]
    pub degraded_error_rate: f64,
    /// Time after the last failed call at which a call-derived Degraded or
    /// Unhealthy status lapses, in seconds
    #[serde(default = "default_recovery_timeout", with = "duration_secs")]
    pub recovery_timeout: Duration,
}

fn default_check_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_check_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_probe_failure_threshold() -> u32 {
    3
}

fn default_unhealthy_consecutive_failures() -> u32 {
    5
}

fn default_degraded_error_rate() -> f64 {
    0.10
}

fn default_recovery_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: default_check_interval(),
            check_timeout: default_check_timeout(),
            probe_failure_threshold: default_probe_failure_threshold(),
            unhealthy_consecutive_failures: default_unhealthy_consecutive_failures(),
            degraded_error_rate: default_degraded_error_rate(),
            recovery_timeout: default_recovery_timeout(),
        }
    }
}
