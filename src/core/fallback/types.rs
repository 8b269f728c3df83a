//! Fallback rule types

use crate::utils::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Observed failure condition that may warrant switching models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    RateLimit,
    Timeout,
    Error,
    HighLatency,
    LowQuality,
    CostLimit,
}

impl FallbackTrigger {
    /// Map a routing or call error to the trigger it represents
    pub fn from_error(error: &GatewayError) -> Self {
        match error {
            GatewayError::RateLimitExceeded(_) => FallbackTrigger::RateLimit,
            GatewayError::BudgetExceeded(_) => FallbackTrigger::CostLimit,
            GatewayError::Timeout(_) => FallbackTrigger::Timeout,
            _ => FallbackTrigger::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackTrigger::RateLimit => "rate_limit",
            FallbackTrigger::Timeout => "timeout",
            FallbackTrigger::Error => "error",
            FallbackTrigger::HighLatency => "high_latency",
            FallbackTrigger::LowQuality => "low_quality",
            FallbackTrigger::CostLimit => "cost_limit",
        }
    }
}

impl fmt::Display for FallbackTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_max_depth() -> usize {
    3
}

/// Fallback chain attached to one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    #[serde(default = "crate::config::default_true")]
    pub enabled: bool,
    /// Alternate models, tried in order
    #[serde(default)]
    pub fallback_models: Vec<String>,
    /// Conditions that warrant a fallback
    #[serde(default)]
    pub triggers: HashSet<FallbackTrigger>,
    /// Maximum number of hops
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Pause the caller should insert between hops, in milliseconds
    #[serde(default, rename = "delay_ms", with = "duration_millis")]
    pub delay: Duration,
}

impl Default for FallbackRule {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_models: Vec::new(),
            triggers: HashSet::new(),
            max_depth: default_max_depth(),
            delay: Duration::ZERO,
        }
    }
}

impl FallbackRule {
    /// Enabled rule over `models` with the default depth and no triggers
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fallback_models: models.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_triggers<I>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = FallbackTrigger>,
    {
        self.triggers = triggers.into_iter().collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Model at `depth`, if the rule permits a hop that deep
    pub fn model_at(&self, depth: usize) -> Option<&str> {
        if !self.enabled || depth >= self.max_depth {
            return None;
        }
        self.fallback_models.get(depth).map(String::as_str)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
