//! Router configuration

use super::*;
use crate::core::router::config::RoutingStrategy;
use crate::utils::error::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouterConfig {
    /// Strategy used when a caller does not name one
    #[serde(default)]
    pub strategy: RoutingStrategy,
    /// Let Degraded providers take part in selection
    #[serde(default)]
    pub admit_degraded: bool,
    /// Circuit breaker configuration applied to every provider
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Template for providers referenced before they are configured
    #[serde(default)]
    pub default_provider: ProviderConfig,
}
