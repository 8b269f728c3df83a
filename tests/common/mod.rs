//! Common test utilities for provider-router
//!
//! Fixtures build real components; time is driven by a [`ManualClock`].

pub mod fixtures;

pub use fixtures::{RecordingNotifier, TestRouter, provider, start_time};
