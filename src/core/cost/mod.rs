//! Cost tracking and budget enforcement
//!
//! - `types` - Usage records, budget periods, alerts and summaries
//! - `ledger` - Capped usage log with per-period spending accumulators
//! - `budget` - Budget guard: recording, budget checks, alert evaluation
//! - `alerts` - Notifier trait for fired alert actions
//! - `optimizer` - Advisory cost hints
//! - `calculator` - Pricing catalog and cost estimation

pub mod alerts;
pub mod budget;
pub mod calculator;
pub mod ledger;
pub mod optimizer;
pub mod types;


pub use alerts::{Notifier, TracingNotifier};
pub use budget::BudgetGuard;
pub use calculator::{
    ModelPricing, PricingCatalog, StaticPricingCatalog, calculate_cost, estimate_cost,
};
pub use ledger::UsageLedger;
pub use optimizer::{Recommendation, RecommendationKind, optimization_recommendations};
pub use types::{
    AlertAction, BudgetAlert, BudgetPeriod, CostBreakdown, CostSummary, FiredAlert, TokenUsage,
    UsageBreakdown, UsageRecord,
};
