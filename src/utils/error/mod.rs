//! Error handling utilities
//!
//! This module provides the crate error type and the circuit breaker used for
//! per-provider failure isolation.

pub mod error;
pub mod recovery;

pub use error::*;
pub use recovery::*;
