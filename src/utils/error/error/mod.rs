//! Error handling for the provider router
//!
//! This module defines the error type used throughout the crate.

mod helpers;
mod types;

pub use types::{GatewayError, Result};
