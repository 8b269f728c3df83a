//! Router configuration validators
//!
//! Validation for routing, circuit breaking and fallback rules.

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::fallback::FallbackRule;
use crate::utils::error::CircuitBreakerConfig;
use std::collections::HashSet;
use tracing::debug;

impl Validate for RouterConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating router configuration");

        self.circuit_breaker.validate()?;
        self.default_provider
            .validate()
            .map_err(|e| format!("Default provider template: {}", e))?;

        Ok(())
    }
}

impl Validate for CircuitBreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("Circuit breaker failure threshold must be greater than 0".to_string());
        }

        if self.timeout.is_zero() {
            return Err("Circuit breaker timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for FallbackRule {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.fallback_models.is_empty() {
            return Err("Enabled fallback rule needs at least one fallback model".to_string());
        }

        let mut seen = HashSet::new();
        for model in &self.fallback_models {
            if model.trim().is_empty() {
                return Err("Fallback model names cannot be empty".to_string());
            }
            if !seen.insert(model) {
                return Err(format!("Duplicate fallback model: {}", model));
            }
        }

        Ok(())
    }
}
