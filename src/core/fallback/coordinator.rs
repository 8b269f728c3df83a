//! Fallback coordinator
//!
//! Holds one rule per model and answers two questions for a caller whose
//! call just failed: should it fall back, and to which model.

use super::types::{FallbackRule, FallbackTrigger};
use crate::utils::error::{GatewayError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Model-level fallback decisions
#[derive(Debug, Default)]
pub struct FallbackCoordinator {
    rules: RwLock<HashMap<String, FallbackRule>>,
}

impl FallbackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a coordinator from configured rules keyed by model id
    pub fn from_rules(rules: HashMap<String, FallbackRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Attach or replace the rule for a model
    pub fn set_rule(&self, model: impl Into<String>, rule: FallbackRule) {
        let model = model.into();
        info!(
            "Setting fallback rule for {}: {:?}",
            model, rule.fallback_models
        );
        self.rules.write().insert(model, rule);
    }

    /// Detach the rule for a model
    pub fn remove_rule(&self, model: &str) -> Option<FallbackRule> {
        self.rules.write().remove(model)
    }

    /// Rule attached to a model
    pub fn rule(&self, model: &str) -> Option<FallbackRule> {
        self.rules.read().get(model).cloned()
    }

    /// Whether `trigger` warrants a fallback for `model`
    pub fn should_fallback(&self, model: &str, trigger: FallbackTrigger) -> bool {
        self.rules
            .read()
            .get(model)
            .is_some_and(|rule| rule.enabled && rule.triggers.contains(&trigger))
    }

    /// The fallback model for hop `depth` (0-based)
    pub fn get_fallback_model(&self, model: &str, depth: usize) -> Result<String> {
        let rules = self.rules.read();
        match rules.get(model).and_then(|rule| rule.model_at(depth)) {
            Some(fallback) => {
                debug!("Fallback for {} at depth {}: {}", model, depth, fallback);
                Ok(fallback.to_string())
            }
            None => Err(GatewayError::no_fallback(model, depth)),
        }
    }

    /// Pause to insert before the next hop for `model`
    pub fn fallback_delay(&self, model: &str) -> Duration {
        self.rules
            .read()
            .get(model)
            .map(|rule| rule.delay)
            .unwrap_or_default()
    }

    /// Models with a rule attached
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.rules.read().keys().cloned().collect();
        models.sort();
        models
    }
}
