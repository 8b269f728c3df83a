//! Failure isolation
//!
//! This module provides the circuit breaker used to isolate persistently
//! failing providers.

pub mod circuit_breaker;
mod types;

pub use circuit_breaker::CircuitBreaker;
pub use types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
pub(crate) use types::duration_secs;
