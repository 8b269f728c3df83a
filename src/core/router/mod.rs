//! Provider registry, gating, and load balancing
//!
//! ## Module Structure
//!
//! - `config` - Routing strategy definitions
//! - `provider` - Provider records and snapshots
//! - `strategy_impl` - Routing strategy implementations
//! - `load_balancer` - Strategy dispatch and per-set cursor state
//! - `registry` - Provider router: gating, selection, outcome reporting

pub mod config;
pub mod load_balancer;
pub mod provider;
pub mod registry;
pub mod strategy_impl;

#[cfg(test)]
mod tests;

pub use config::RoutingStrategy;
pub use load_balancer::LoadBalancer;
pub use provider::{ProviderRecord, ProviderSnapshot};
pub use registry::{CallOutcome, ProviderRouter};
pub use strategy_impl::{Candidate, effective_cost};
