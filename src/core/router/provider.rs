//! Provider records held by the registry

use crate::config::ProviderConfig;
use crate::core::health::HealthState;
use crate::core::rate_limiter::RateLimitUsage;
use crate::utils::error::CircuitBreakerMetrics;
use serde::{Deserialize, Serialize};

/// One provider: its configuration plus live health
#[derive(Debug, Clone)]
pub struct ProviderRecord {
    pub config: ProviderConfig,
    pub health: HealthState,
}

impl ProviderRecord {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            health: HealthState::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }
}

/// Point-in-time view of a provider across health, breaker and rate limiter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub config: ProviderConfig,
    pub health: HealthState,
    pub circuit: CircuitBreakerMetrics,
    pub usage: RateLimitUsage,
}
