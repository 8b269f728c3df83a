//! Integration tests for provider-router
//!
//! These tests drive the public API end to end. Only the outer seams
//! (health probes, alert notifiers) are replaced.

pub mod budget_tests;
pub mod fallback_tests;
pub mod routing_tests;
