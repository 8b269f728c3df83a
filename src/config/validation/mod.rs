//! Configuration validation
//!
//! - `trait_def`: Core Validate trait definition
//! - `config_validators`: Gateway, provider, health, budget and logging validators
//! - `router_validators`: Router, circuit breaker and fallback validators
//! - `tests`: Test suite for all validators

mod config_validators;
mod router_validators;
mod trait_def;

pub use trait_def::Validate;
