//! Advisory cost optimization hints
//!
//! These never gate a request. They read a [`CostSummary`] and suggest where
//! spending could drop.

use super::types::CostSummary;
use serde::{Deserialize, Serialize};

/// Models used fewer times than this are candidates for substitution
const LOW_USAGE_REQUESTS: u64 = 10;
/// Per-request cost above which a low-usage model is flagged
const EXPENSIVE_REQUEST_COST: f64 = 0.10;
/// Average input tokens per request above which context trimming is suggested
const LARGE_CONTEXT_TOKENS: f64 = 8000.0;

/// Kind of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Use a cheaper model
    ModelSubstitution,
    /// Send less context
    ContextTrimming,
    /// Route to a cheaper provider
    ProviderSwitch,
}

/// One optimization hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    /// Model or provider id the hint is about
    pub target: String,
    pub description: String,
    /// Estimated saving in USD over the summarized range
    pub estimated_savings: f64,
    /// 0.0 to 1.0
    pub confidence: f64,
}

/// Derive optimization hints from a cost summary
pub fn optimization_recommendations(summary: &CostSummary) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let mut models: Vec<_> = summary.model_breakdown.iter().collect();
    models.sort_by(|a, b| a.0.cmp(b.0));

    for (model, usage) in &models {
        if usage.requests < LOW_USAGE_REQUESTS && usage.cost_per_request > EXPENSIVE_REQUEST_COST {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ModelSubstitution,
                target: (*model).clone(),
                description: format!(
                    "Model {} is rarely used but costs ${:.4} per request; consider a cheaper model",
                    model, usage.cost_per_request
                ),
                estimated_savings: usage.total_cost * 0.5,
                confidence: 0.7,
            });
        }

        if usage.average_input_tokens() > LARGE_CONTEXT_TOKENS {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ContextTrimming,
                target: (*model).clone(),
                description: format!(
                    "Requests to {} average {:.0} input tokens; consider trimming context",
                    model,
                    usage.average_input_tokens()
                ),
                estimated_savings: usage.input_cost * 0.3,
                confidence: 0.8,
            });
        }
    }

    let active: Vec<_> = summary
        .provider_breakdown
        .iter()
        .filter(|(_, usage)| usage.requests > 0)
        .collect();
    if active.len() >= 2 {
        let most_expensive = active.iter().max_by(|a, b| {
            a.1.cost_per_request
                .total_cmp(&b.1.cost_per_request)
                .then_with(|| b.0.cmp(a.0))
        });
        if let Some((provider, usage)) = most_expensive {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ProviderSwitch,
                target: (*provider).clone(),
                description: format!(
                    "Provider {} has the highest cost per request (${:.4}); consider routing elsewhere",
                    provider, usage.cost_per_request
                ),
                estimated_savings: usage.total_cost * 0.4,
                confidence: 0.6,
            });
        }
    }

    recommendations
}
