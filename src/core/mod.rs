//! Core routing and resilience logic
//!
//! - `router` - Provider registry, gating and load balancing
//! - `health` - Provider health state and background probing
//! - `rate_limiter` - Per-provider sliding-window limits
//! - `cost` - Usage ledger, budgets and alerts
//! - `fallback` - Model fallback sequencing

pub mod cost; // Budgets and usage ledger
pub mod fallback;
pub mod health; // Health monitoring system
pub mod rate_limiter; // Rate limiting system
pub mod router;
