//! Core configuration validators
//!
//! Validation for the gateway root, providers, health, budget and logging
//! sections.

use super::trait_def::Validate;
use crate::config::models::*;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        // Check for duplicate provider ids
        let mut provider_ids = HashSet::new();
        for provider in &self.providers {
            if !provider_ids.insert(&provider.id) {
                return Err(format!("Duplicate provider id: {}", provider.id));
            }
            provider.validate()?;
        }

        self.logging.validate()?;
        self.router.validate()?;
        self.health.validate()?;
        self.budget.validate()?;

        for (model, rule) in &self.fallbacks {
            rule.validate()
                .map_err(|e| format!("Fallback rule for {}: {}", model, e))?;
        }

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating provider configuration: {}", self.id);

        if self.id.trim().is_empty() {
            return Err("Provider id cannot be empty".to_string());
        }

        if let Some(base_url) = &self.base_url {
            let url = Url::parse(base_url)
                .map_err(|e| format!("Provider {} has invalid base_url: {}", self.id, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "Provider {} base_url must use http or https, got {}",
                    self.id,
                    url.scheme()
                ));
            }
        }

        if self.rate_limit.requests_per_minute == Some(0) {
            return Err(format!(
                "Provider {} requests_per_minute must be greater than 0 (omit it for unlimited)",
                self.id
            ));
        }

        if self.rate_limit.concurrent_requests == Some(0) {
            return Err(format!(
                "Provider {} concurrent_requests must be greater than 0 (omit it for unlimited)",
                self.id
            ));
        }

        if !self.cost.cost_multiplier.is_finite() || self.cost.cost_multiplier < 0.0 {
            return Err(format!(
                "Provider {} cost_multiplier must be a non-negative number",
                self.id
            ));
        }

        if let Some(cap) = self.cost.max_cost_per_request {
            if !cap.is_finite() || cap < 0.0 {
                return Err(format!(
                    "Provider {} max_cost_per_request must be a non-negative number",
                    self.id
                ));
            }
        }

        if self.timeout.is_zero() {
            return Err(format!("Provider {} timeout must be greater than 0", self.id));
        }

        Ok(())
    }
}

impl Validate for HealthConfig {
    fn validate(&self) -> Result<(), String> {
        if self.check_interval.is_zero() {
            return Err("Health check interval must be greater than 0".to_string());
        }

        if self.check_timeout.is_zero() {
            return Err("Health check timeout must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.degraded_error_rate) {
            return Err("Degraded error rate must be between 0.0 and 1.0".to_string());
        }

        if self.recovery_timeout.is_zero() {
            return Err("Health recovery timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for BudgetConfig {
    fn validate(&self) -> Result<(), String> {
        for (period, amount) in &self.budgets {
            if !amount.is_finite() || *amount < 0.0 {
                return Err(format!("{} budget must be a non-negative number", period));
            }
        }

        if self.ledger_capacity == 0 {
            return Err("Ledger capacity must be greater than 0".to_string());
        }

        let mut alert_ids = HashSet::new();
        for alert in &self.alerts {
            if !alert_ids.insert(&alert.id) {
                return Err(format!("Duplicate budget alert id: {}", alert.id));
            }
            if alert.threshold.is_none() && alert.threshold_percent.is_none() {
                return Err(format!(
                    "Budget alert {} needs a threshold or threshold_percent",
                    alert.id
                ));
            }
            if let Some(percent) = alert.threshold_percent {
                if !(0.0..=100.0).contains(&percent) {
                    return Err(format!(
                        "Budget alert {} threshold_percent must be between 0 and 100",
                        alert.id
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }
        Ok(())
    }
}
