//! # provider-router
//!
//! Resilience and routing layer for a multi-vendor LLM gateway.
//!
//! Given a set of candidate providers, the router picks one that is healthy,
//! not circuit-broken, within its rate limits, and affordable under the
//! configured budgets, using a pluggable load-balancing strategy. Callers
//! report each outcome back so health, breaker state, in-flight counts and
//! spending stay current.
//!
//! ## Features
//!
//! - **Circuit breaking**: per-provider Closed/Open/Half-Open state machine
//! - **Health monitoring**: periodic reachability probes plus call-derived status
//! - **Rate limiting**: sliding one-minute window and concurrency caps
//! - **Budgets**: hourly/daily/monthly spending limits, alerts, cost summaries
//! - **Load balancing**: round robin, least latency, lowest cost, weighted,
//!   least connections, random
//! - **Fallback**: per-model fallback chains keyed by failure trigger
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use provider_router::{Config, ProviderRouter, RoutingStrategy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/router.yaml").await?;
//!     let router = ProviderRouter::new(&config.gateway);
//!
//!     let provider = router.select_provider(&["openai", "anthropic"], RoutingStrategy::LowestCost)?;
//!     // ... call the provider ...
//!     router.update_provider_metrics(&provider, Duration::from_millis(420), true, None);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::cost::{
    AlertAction, BudgetAlert, BudgetGuard, BudgetPeriod, CostBreakdown, CostSummary, FiredAlert,
    Notifier, TokenUsage, TracingNotifier, UsageRecord,
};
pub use core::fallback::{FallbackCoordinator, FallbackRule, FallbackTrigger};
pub use core::health::{HealthMonitor, HealthProbe, HealthStatus, HttpProbe, SystemHealth};
pub use core::rate_limiter::{RateLimitResult, RateLimiter};
pub use core::router::{CallOutcome, ProviderRouter, RoutingStrategy};
pub use utils::error::{CircuitBreaker, CircuitState};
pub use utils::time::{Clock, ManualClock, SystemClock};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
