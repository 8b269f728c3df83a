//! Provider health tracking
//!
//! A provider's health is fed by two independent signals: reachability
//! probes and reported call outcomes. Each writes its own status field and
//! the effective status is recomputed from both after every update.

use super::types::{HealthCheckResult, HealthStatus};
use crate::config::HealthConfig;
use crate::utils::time::elapsed_between;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Provider health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthState {
    /// Effective status used by selection
    pub status: HealthStatus,
    /// Status from the most recent probe
    pub probe_status: HealthStatus,
    /// Status derived from reported call outcomes
    pub derived_status: HealthStatus,
    /// Operator maintenance toggle
    pub maintenance: bool,
    /// Running mean latency of reported calls, in milliseconds
    pub average_latency_ms: f64,
    /// Fraction of calls in the current window that succeeded
    pub success_rate: f64,
    /// Fraction of calls in the current window that failed
    pub error_rate: f64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Calls since the call-derived status was last cleared
    pub window_requests: u64,
    pub window_failures: u64,
    /// Failed calls since the last success
    pub consecutive_failures: u32,
    /// When the most recent call failed
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Failed probes since the last successful probe
    pub consecutive_probe_failures: u32,
    /// Last reported error (call or probe)
    pub last_error: Option<String>,
    /// When the provider was last probed
    pub last_probe_at: Option<DateTime<Utc>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Fresh state: no probe yet, nothing reported against it
    pub fn new() -> Self {
        let probe_status = HealthStatus::Unknown;
        let derived_status = HealthStatus::Healthy;
        Self {
            status: HealthStatus::combine(probe_status, derived_status, false),
            probe_status,
            derived_status,
            maintenance: false,
            average_latency_ms: 0.0,
            success_rate: 1.0,
            error_rate: 0.0,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            window_requests: 0,
            window_failures: 0,
            consecutive_failures: 0,
            last_failure_at: None,
            consecutive_probe_failures: 0,
            last_error: None,
            last_probe_at: None,
        }
    }

    /// Whether any call latency has been observed
    pub fn has_latency_samples(&self) -> bool {
        self.total_requests > 0
    }

    /// Fold one reported call outcome, finished at `at`, into the running metrics
    ///
    /// Latency and request totals cover the provider's lifetime. The error
    /// rate that drives the derived status only covers the current window.
    pub fn record_outcome(
        &mut self,
        latency: Duration,
        success: bool,
        error: Option<String>,
        at: DateTime<Utc>,
        config: &HealthConfig,
    ) {
        self.total_requests += 1;
        let n = self.total_requests as f64;
        let latency_ms = latency.as_secs_f64() * 1000.0;
        self.average_latency_ms += (latency_ms - self.average_latency_ms) / n;

        self.window_requests += 1;
        if success {
            self.successful_requests += 1;
            self.consecutive_failures = 0;
        } else {
            self.failed_requests += 1;
            self.window_failures += 1;
            self.consecutive_failures += 1;
            self.last_failure_at = Some(at);
            if error.is_some() {
                self.last_error = error;
            }
        }

        self.error_rate = self.window_failures as f64 / self.window_requests as f64;
        self.success_rate = 1.0 - self.error_rate;

        self.derived_status = if self.consecutive_failures > config.unhealthy_consecutive_failures
        {
            HealthStatus::Unhealthy
        } else if self.error_rate > config.degraded_error_rate {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        self.refresh_status();
    }

    /// Fold one probe result into the probe status
    ///
    /// A successful probe taken after the last failed call also clears a
    /// call-derived Degraded or Unhealthy status.
    pub fn apply_probe(&mut self, result: &HealthCheckResult, config: &HealthConfig) {
        self.last_probe_at = Some(result.timestamp);
        if result.success {
            self.consecutive_probe_failures = 0;
            self.probe_status = HealthStatus::Healthy;
            let newer = self
                .last_failure_at
                .is_none_or(|failed_at| failed_at <= result.timestamp);
            if self.derived_status != HealthStatus::Healthy && newer {
                self.clear_derived();
            }
        } else {
            self.consecutive_probe_failures += 1;
            if let Some(error) = &result.error {
                self.last_error = Some(error.clone());
            }
            self.probe_status = if self.consecutive_probe_failures > config.probe_failure_threshold
            {
                HealthStatus::Unhealthy
            } else {
                HealthStatus::Degraded
            };
        }
        self.refresh_status();
    }

    /// Whether the call-derived status is non-healthy and its last failure is
    /// older than `recovery_timeout`
    pub fn derived_expired(&self, now: DateTime<Utc>, config: &HealthConfig) -> bool {
        self.derived_status != HealthStatus::Healthy
            && self
                .last_failure_at
                .is_some_and(|at| elapsed_between(at, now) >= config.recovery_timeout)
    }

    /// Clear an expired call-derived status; returns whether anything changed
    pub fn expire_derived(&mut self, now: DateTime<Utc>, config: &HealthConfig) -> bool {
        if !self.derived_expired(now, config) {
            return false;
        }
        self.clear_derived();
        self.refresh_status();
        true
    }

    /// Start a fresh window: derived status back to Healthy
    fn clear_derived(&mut self) {
        self.derived_status = HealthStatus::Healthy;
        self.consecutive_failures = 0;
        self.window_requests = 0;
        self.window_failures = 0;
        self.error_rate = 0.0;
        self.success_rate = 1.0;
    }

    /// Enter or leave maintenance
    pub fn set_maintenance(&mut self, maintenance: bool) {
        self.maintenance = maintenance;
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        self.status = HealthStatus::combine(self.probe_status, self.derived_status, self.maintenance);
    }
}

/// Counts of providers per effective status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub maintenance: usize,
    pub unknown: usize,
}

impl SystemHealth {
    /// Summarize a set of provider statuses
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        let mut summary = SystemHealth::default();
        for status in statuses {
            summary.total += 1;
            match status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
                HealthStatus::Maintenance => summary.maintenance += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// Overall status of the provider pool
    pub fn overall_status(&self) -> HealthStatus {
        if self.total == 0 {
            HealthStatus::Unknown
        } else if self.healthy == self.total {
            HealthStatus::Healthy
        } else if self.healthy + self.degraded > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Per-status counts keyed by status name
    pub fn metrics(&self) -> HashMap<String, f64> {
        let mut metrics = HashMap::new();
        metrics.insert("total_providers".to_string(), self.total as f64);
        metrics.insert("healthy_providers".to_string(), self.healthy as f64);
        metrics.insert("degraded_providers".to_string(), self.degraded as f64);
        metrics.insert("unhealthy_providers".to_string(), self.unhealthy as f64);
        if self.total > 0 {
            metrics.insert(
                "health_percentage".to_string(),
                self.healthy as f64 / self.total as f64 * 100.0,
            );
        }
        metrics
    }
}
