//! Top-level router configuration

use super::*;
use crate::core::cost::BudgetPeriod;
use crate::core::fallback::FallbackRule;
use crate::core::router::config::RoutingStrategy;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "PROVIDER_ROUTER";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Router configuration
    #[serde(default)]
    pub router: RouterConfig,
    /// Health monitor configuration
    #[serde(default)]
    pub health: HealthConfig,
    /// Provider configurations
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Budget configuration
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Fallback rules keyed by model id
    #[serde(default)]
    pub fallbacks: HashMap<String, FallbackRule>,
}

impl GatewayConfig {
    /// Build a configuration from defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `PROVIDER_ROUTER_*` environment variables on top of this configuration
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(format!("{}_{}", ENV_PREFIX, key)).ok())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(strategy) = lookup("STRATEGY") {
            self.router.strategy = RoutingStrategy::from_name(&strategy);
        }
        if let Some(interval) = lookup("HEALTH_CHECK_INTERVAL") {
            let secs = parse_env_number::<u64>("HEALTH_CHECK_INTERVAL", &interval)?;
            self.health.check_interval = Duration::from_secs(secs);
        }
        for (key, period) in [
            ("HOURLY_BUDGET", BudgetPeriod::Hourly),
            ("DAILY_BUDGET", BudgetPeriod::Daily),
            ("MONTHLY_BUDGET", BudgetPeriod::Monthly),
        ] {
            if let Some(value) = lookup(key) {
                let amount = parse_env_number::<f64>(key, &value)?;
                self.budget.budgets.insert(period, amount);
            }
        }
        Ok(())
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        GatewayError::config(format!(
            "Invalid value for {}_{}: {}",
            ENV_PREFIX, key, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = GatewayConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("STRATEGY", "lowest_cost"),
                ("DAILY_BUDGET", "100.5"),
                ("LOG_LEVEL", "debug"),
                ("HEALTH_CHECK_INTERVAL", "15"),
            ]))
            .unwrap();

        assert_eq!(config.router.strategy, RoutingStrategy::LowestCost);
        assert_eq!(config.budget.budgets.get(&BudgetPeriod::Daily), Some(&100.5));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.health.check_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_invalid_number_override_rejected() {
        let mut config = GatewayConfig::default();
        let result = config.apply_overrides(lookup_from(&[("MONTHLY_BUDGET", "lots")]));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_unknown_strategy_override_falls_back() {
        let mut config = GatewayConfig::default();
        config
            .apply_overrides(lookup_from(&[("STRATEGY", "fastest_please")]))
            .unwrap();
        assert_eq!(config.router.strategy, RoutingStrategy::RoundRobin);
    }
}
