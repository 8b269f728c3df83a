//! Cost estimation against a pricing catalog
//!
//! The catalog itself is supplied by the embedding application; this module
//! only turns token counts into dollars.

use super::types::{CostBreakdown, TokenUsage};
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-model token prices in USD per 1K tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_cost_per_1k_tokens: f64,
    pub output_cost_per_1k_tokens: f64,
    /// Defaults to the input price
    #[serde(default)]
    pub cached_input_cost_per_1k_tokens: Option<f64>,
    /// Defaults to the output price
    #[serde(default)]
    pub reasoning_cost_per_1k_tokens: Option<f64>,
}

impl ModelPricing {
    pub fn new(input_cost_per_1k_tokens: f64, output_cost_per_1k_tokens: f64) -> Self {
        Self {
            input_cost_per_1k_tokens,
            output_cost_per_1k_tokens,
            cached_input_cost_per_1k_tokens: None,
            reasoning_cost_per_1k_tokens: None,
        }
    }
}

/// Source of model prices
pub trait PricingCatalog: Send + Sync {
    /// Pricing for a model, if known
    fn pricing(&self, model: &str) -> Option<ModelPricing>;
}

/// In-memory pricing catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPricingCatalog {
    models: HashMap<String, ModelPricing>,
}

impl StaticPricingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a model's pricing (builder pattern)
    pub fn with_model(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.insert(model, pricing);
        self
    }

    pub fn insert(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.models.insert(model.into(), pricing);
    }
}

impl PricingCatalog for StaticPricingCatalog {
    fn pricing(&self, model: &str) -> Option<ModelPricing> {
        self.models.get(model).copied()
    }
}

fn tokens_to_cost(tokens: u64, cost_per_1k: f64) -> f64 {
    tokens as f64 / 1000.0 * cost_per_1k
}

fn lookup(catalog: &dyn PricingCatalog, model: &str) -> Result<ModelPricing> {
    catalog
        .pricing(model)
        .ok_or_else(|| GatewayError::Cost(format!("No pricing for model {}", model)))
}

/// Estimated total cost of a call before it is made
pub fn estimate_cost(
    catalog: &dyn PricingCatalog,
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
) -> Result<f64> {
    let pricing = lookup(catalog, model)?;
    Ok(tokens_to_cost(input_tokens, pricing.input_cost_per_1k_tokens)
        + tokens_to_cost(output_tokens, pricing.output_cost_per_1k_tokens))
}

/// Cost breakdown of a completed call
pub fn calculate_cost(
    catalog: &dyn PricingCatalog,
    model: &str,
    usage: &TokenUsage,
) -> Result<CostBreakdown> {
    let pricing = lookup(catalog, model)?;
    let cached_rate = pricing
        .cached_input_cost_per_1k_tokens
        .unwrap_or(pricing.input_cost_per_1k_tokens);
    let reasoning_rate = pricing
        .reasoning_cost_per_1k_tokens
        .unwrap_or(pricing.output_cost_per_1k_tokens);

    let mut breakdown = CostBreakdown {
        input_cost: tokens_to_cost(usage.input_tokens, pricing.input_cost_per_1k_tokens),
        output_cost: tokens_to_cost(usage.output_tokens, pricing.output_cost_per_1k_tokens),
        cached_cost: tokens_to_cost(usage.cached_tokens, cached_rate),
        reasoning_cost: tokens_to_cost(usage.reasoning_tokens, reasoning_rate),
        total_cost: 0.0,
    };
    breakdown.normalize();
    Ok(breakdown)
}
