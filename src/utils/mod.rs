//! Utility modules for the provider router
//!
//! ## Module Organization
//!
//! - **error**: Error type and circuit breaker
//! - **logging**: Tracing subscriber setup
//! - **time**: Clock abstraction

pub mod error; // Error handling
pub mod logging; // Logging setup
pub mod time;

pub use error::{GatewayError, Result};
pub use logging::init_logging;
pub use time::{Clock, ManualClock, SharedClock, SystemClock};
