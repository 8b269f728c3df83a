//! Provider configuration

use super::*;
use crate::utils::error::duration_secs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-provider request limits (`None` = unlimited)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Requests allowed in the trailing one-minute window
    #[serde(default = "default_rpm")]
    pub requests_per_minute: Option<u32>,
    /// Requests allowed in flight at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: Option<u32>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: default_rpm(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

impl RateLimitSettings {
    /// No request or concurrency limit
    pub fn unlimited() -> Self {
        Self {
            requests_per_minute: None,
            concurrent_requests: None,
        }
    }
}

/// Per-provider cost settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    /// Relative price of this provider (1.0 = list price)
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: f64,
    /// Hard cap on the estimated cost of a single request
    #[serde(default)]
    pub max_cost_per_request: Option<f64>,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            cost_multiplier: default_cost_multiplier(),
            max_cost_per_request: None,
        }
    }
}

/// Per-provider load balancing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancingSettings {
    /// Weight for weighted round-robin (0 = never chosen while others are eligible)
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl Default for LoadBalancingSettings {
    fn default() -> Self {
        Self {
            weight: default_weight(),
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier
    pub id: String,
    /// Base URL used for reachability probes
    #[serde(default)]
    pub base_url: Option<String>,
    /// Whether provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Priority (lower value = preferred)
    #[serde(default)]
    pub priority: u32,
    /// Rate limit settings
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Cost settings
    #[serde(default)]
    pub cost: CostSettings,
    /// Load balancing settings
    #[serde(default)]
    pub load_balancing: LoadBalancingSettings,
    /// Request timeout in seconds
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    /// Maximum retries the caller should attempt against this provider
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

impl ProviderConfig {
    /// Create a provider configuration with default settings
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: None,
            enabled: true,
            priority: 0,
            rate_limit: RateLimitSettings::default(),
            cost: CostSettings::default(),
            load_balancing: LoadBalancingSettings::default(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
        }
    }

    /// Instantiate this configuration as a template for another provider
    ///
    /// The template's `base_url` is not inherited.
    pub fn instantiate(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: None,
            ..self.clone()
        }
    }

    /// Set the probe base URL (builder pattern)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the cost multiplier (builder pattern)
    pub fn with_cost_multiplier(mut self, cost_multiplier: f64) -> Self {
        self.cost.cost_multiplier = cost_multiplier;
        self
    }

    /// Set the rate limits (builder pattern)
    pub fn with_rate_limit(mut self, rate_limit: RateLimitSettings) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the load balancing weight (builder pattern)
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.load_balancing.weight = weight;
        self
    }

    /// Set the priority (builder pattern)
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the enabled flag (builder pattern)
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
