//! Health status types and check results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with elevated errors or failing probes
    Degraded,
    /// Not serving traffic until it recovers
    Unhealthy,
    /// Taken out of rotation by an operator
    Maintenance,
    /// No signal yet
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Check if the status allows requests
    ///
    /// Degraded providers only take traffic when the router admits them.
    pub fn allows_requests(&self, admit_degraded: bool) -> bool {
        match self {
            HealthStatus::Healthy => true,
            HealthStatus::Degraded => admit_degraded,
            _ => false,
        }
    }

    /// Severity rank used when merging signals (higher is worse)
    ///
    /// `Unknown` carries no information and ranks below `Healthy`.
    fn severity(&self) -> u8 {
        match self {
            HealthStatus::Unknown => 0,
            HealthStatus::Healthy => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unhealthy => 3,
            HealthStatus::Maintenance => 4,
        }
    }

    /// Merge the probe-derived and call-derived statuses into the effective one
    ///
    /// Maintenance overrides everything. Otherwise the worse of the two known
    /// statuses wins; `Unknown` only survives when both sides are unknown.
    pub fn combine(probe: HealthStatus, derived: HealthStatus, maintenance: bool) -> HealthStatus {
        if maintenance {
            return HealthStatus::Maintenance;
        }
        let worst = if probe.severity() >= derived.severity() {
            probe
        } else {
            derived
        };
        // Neither path ever writes Maintenance, but keep the merge total.
        if worst == HealthStatus::Maintenance {
            HealthStatus::Unhealthy
        } else {
            worst
        }
    }

    /// Lowercase status name
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Maintenance => "maintenance",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single reachability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Whether the endpoint answered with a non-error status
    pub success: bool,
    /// Response time in milliseconds
    pub response_time_ms: u64,
    /// Timestamp of the check
    pub timestamp: DateTime<Utc>,
    /// Error message if the probe failed
    pub error: Option<String>,
}

impl HealthCheckResult {
    /// Create a successful result
    pub fn healthy(response_time_ms: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            response_time_ms,
            timestamp,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failed(error: impl Into<String>, response_time_ms: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: false,
            response_time_ms,
            timestamp,
            error: Some(error.into()),
        }
    }
}
