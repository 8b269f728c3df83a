//! Core rate limiter implementation

use super::types::{ProviderWindow, RateLimitResult, RateLimitUsage, RequestId, RequestRecord};
use crate::config::RateLimitSettings;
use crate::utils::time::SharedClock;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Trailing window used for requests-per-minute accounting
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Per-provider trailing-window rate limiter
///
/// A request counts against the window while `now - timestamp <= window`.
pub struct RateLimiter {
    /// Request windows by provider id
    pub(super) windows: DashMap<String, Mutex<ProviderWindow>>,
    /// Window duration
    pub(super) window: chrono::Duration,
    clock: SharedClock,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("providers", &self.windows.len())
            .field("window", &self.window)
            .finish()
    }
}

impl RateLimiter {
    /// Create a new rate limiter with the one-minute window
    pub fn new(clock: SharedClock) -> Self {
        Self::with_window(clock, RATE_LIMIT_WINDOW)
    }

    /// Create a rate limiter with custom window
    pub fn with_window(clock: SharedClock, window: Duration) -> Self {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::seconds(60));
        Self {
            windows: DashMap::new(),
            window,
            clock,
        }
    }

    fn with_window_for<R>(&self, provider_id: &str, f: impl FnOnce(&mut ProviderWindow) -> R) -> R {
        let now = self.clock.now();
        if let Some(entry) = self.windows.get(provider_id) {
            let mut window = entry.lock();
            window.prune(now, self.window);
            return f(&mut window);
        }
        let entry = self
            .windows
            .entry(provider_id.to_string())
            .or_insert_with(|| Mutex::new(ProviderWindow::default()));
        let mut window = entry.lock();
        window.prune(now, self.window);
        f(&mut window)
    }

    fn evaluate(&self, window: &ProviderWindow, settings: &RateLimitSettings) -> RateLimitResult {
        let usage = window.usage();
        let rpm_ok = settings
            .requests_per_minute
            .is_none_or(|limit| usage.requests_in_window < limit);
        let concurrency_ok = settings
            .concurrent_requests
            .is_none_or(|limit| usage.active_requests < limit);

        let retry_after = if rpm_ok {
            None
        } else {
            window.history.front().map(|oldest| {
                let age = self.clock.now() - oldest.timestamp;
                (self.window - age).to_std().unwrap_or(Duration::ZERO)
            })
        };

        RateLimitResult {
            allowed: rpm_ok && concurrency_ok,
            requests_in_window: usage.requests_in_window,
            limit: settings.requests_per_minute,
            remaining: settings
                .requests_per_minute
                .map(|limit| limit.saturating_sub(usage.requests_in_window)),
            active_requests: usage.active_requests,
            concurrent_limit: settings.concurrent_requests,
            retry_after,
        }
    }

    /// Whether a new request to `provider_id` would be admitted right now
    pub fn is_within_rate_limit(&self, provider_id: &str, settings: &RateLimitSettings) -> bool {
        self.check(provider_id, settings).allowed
    }

    /// Check limits without recording anything
    pub fn check(&self, provider_id: &str, settings: &RateLimitSettings) -> RateLimitResult {
        let now = self.clock.now();
        match self.windows.get(provider_id) {
            Some(entry) => {
                let mut window = entry.lock();
                window.prune(now, self.window);
                self.evaluate(&window, settings)
            }
            None => self.evaluate(&ProviderWindow::default(), settings),
        }
    }

    /// Record a new in-flight request regardless of limits
    pub fn start_request(&self, provider_id: &str, settings: &RateLimitSettings) -> RequestId {
        let now = self.clock.now();
        self.with_window_for(provider_id, |window| {
            Self::admit(window, provider_id, now, settings)
        })
    }

    /// Atomically check limits and, if allowed, record a new in-flight request
    pub fn try_start_request(
        &self,
        provider_id: &str,
        settings: &RateLimitSettings,
    ) -> Option<RequestId> {
        let now = self.clock.now();
        self.with_window_for(provider_id, |window| {
            if self.evaluate(window, settings).allowed {
                Some(Self::admit(window, provider_id, now, settings))
            } else {
                debug!("Rate limit reached for provider {}", provider_id);
                None
            }
        })
    }

    fn admit(
        window: &mut ProviderWindow,
        provider_id: &str,
        now: chrono::DateTime<chrono::Utc>,
        settings: &RateLimitSettings,
    ) -> RequestId {
        let record = RequestRecord {
            id: Uuid::new_v4(),
            provider_id: provider_id.to_string(),
            timestamp: window.next_timestamp(now),
            active: true,
        };
        let id = record.id;

        window.active.push_back(record.clone());
        window.history.push_back(RequestRecord {
            active: false,
            ..record
        });
        if let Some(cap) = settings.requests_per_minute {
            while window.history.len() > cap as usize {
                window.history.pop_front();
            }
        }
        id
    }

    /// Mark a specific request as finished
    pub fn finish_request(&self, provider_id: &str, request_id: RequestId) -> bool {
        let Some(entry) = self.windows.get(provider_id) else {
            return false;
        };
        let mut window = entry.lock();
        match window.active.iter().position(|r| r.id == request_id) {
            Some(index) => {
                window.active.remove(index);
                true
            }
            None => false,
        }
    }

    /// Mark the oldest in-flight request as finished
    pub fn finish_oldest(&self, provider_id: &str) -> bool {
        self.windows
            .get(provider_id)
            .and_then(|entry| entry.lock().active.pop_front())
            .is_some()
    }

    /// Withdraw a request that was admitted but never sent
    ///
    /// Removes it from both the in-flight set and the window.
    pub fn cancel_request(&self, provider_id: &str, request_id: RequestId) {
        if let Some(entry) = self.windows.get(provider_id) {
            let mut window = entry.lock();
            window.active.retain(|r| r.id != request_id);
            window.history.retain(|r| r.id != request_id);
        }
    }

    /// Current usage for a provider
    pub fn usage(&self, provider_id: &str) -> RateLimitUsage {
        let now = self.clock.now();
        self.windows
            .get(provider_id)
            .map(|entry| {
                let mut window = entry.lock();
                window.prune(now, self.window);
                window.usage()
            })
            .unwrap_or_default()
    }

    /// Requests currently in flight for a provider
    pub fn active_requests(&self, provider_id: &str) -> u32 {
        self.windows
            .get(provider_id)
            .map(|entry| entry.lock().active.len() as u32)
            .unwrap_or(0)
    }

    /// Windowed request records for a provider, oldest first
    pub fn records(&self, provider_id: &str) -> Vec<RequestRecord> {
        let now = self.clock.now();
        self.windows
            .get(provider_id)
            .map(|entry| {
                let mut window = entry.lock();
                window.prune(now, self.window);
                let active: Vec<RequestId> = window.active.iter().map(|r| r.id).collect();
                window
                    .history
                    .iter()
                    .map(|r| RequestRecord {
                        active: active.contains(&r.id),
                        ..r.clone()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
