//! Rate limiter types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use uuid::Uuid;

/// Identifier handed out for every admitted request
pub type RequestId = Uuid;

/// One admitted request against a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,
    pub provider_id: String,
    pub timestamp: DateTime<Utc>,
    /// Still in flight
    pub active: bool,
}

/// Rate limit result
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    /// Whether a new request would be allowed
    pub allowed: bool,
    /// Requests counted in the trailing window
    pub requests_in_window: u32,
    /// Requests-per-minute limit, if any
    pub limit: Option<u32>,
    /// Remaining requests in the window, if limited
    pub remaining: Option<u32>,
    /// Requests currently in flight
    pub active_requests: u32,
    /// Concurrency limit, if any
    pub concurrent_limit: Option<u32>,
    /// When the oldest windowed request ages out (only set when the window is full)
    pub retry_after: Option<Duration>,
}

/// Point-in-time usage for one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitUsage {
    pub requests_in_window: u32,
    pub active_requests: u32,
}

/// Per-provider request window
///
/// `history` is ordered by insertion time and holds at most
/// `requests_per_minute` entries; anything older than the window is pruned
/// from the front. In-flight requests live in `active` independently, so a
/// long call keeps counting toward concurrency after it leaves the window.
#[derive(Debug, Default)]
pub(super) struct ProviderWindow {
    pub(super) history: VecDeque<RequestRecord>,
    pub(super) active: VecDeque<RequestRecord>,
}

impl ProviderWindow {
    /// Drop history entries strictly older than `window`
    pub(super) fn prune(&mut self, now: DateTime<Utc>, window: chrono::Duration) {
        while let Some(front) = self.history.front() {
            if now - front.timestamp > window {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Timestamp for a new record, never earlier than the newest one held
    pub(super) fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.history.back() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }

    pub(super) fn usage(&self) -> RateLimitUsage {
        RateLimitUsage {
            requests_in_window: self.history.len() as u32,
            active_requests: self.active.len() as u32,
        }
    }
}
