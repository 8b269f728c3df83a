//! Circuit breaker implementation for per-provider failure isolation

use super::types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
use crate::utils::time::{SharedClock, elapsed_between};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<DateTime<Utc>>,
    /// When the half-open trial was handed out, if one is in flight
    trial_started: Option<DateTime<Utc>>,
}

/// Circuit breaker
///
/// Closed until `failure_threshold` consecutive failures, then Open for
/// `timeout` after the most recent failure. Once the timeout has elapsed a
/// single trial request is granted (Half-Open); its outcome closes or re-opens
/// the circuit. All transitions happen under the breaker's own lock, so at
/// most one trial is in flight at a time.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: SharedClock,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, clock: SharedClock) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_started: None,
            }),
        }
    }

    fn threshold(&self) -> u32 {
        self.config.failure_threshold.max(1)
    }

    fn timeout_elapsed(&self, since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match since {
            Some(at) => elapsed_between(at, now) >= self.config.timeout,
            None => true,
        }
    }

    /// Ask permission to send a request, consuming the half-open trial if
    /// this call is the one that obtains it
    pub fn can_request(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.timeout_elapsed(inner.last_failure, now) {
                    debug!(breaker = %self.name, "Circuit breaker transitioning from Open to HalfOpen");
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_started = Some(now);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                // A trial whose outcome was never reported is reissued after another timeout
                if inner.trial_started.is_none() || self.timeout_elapsed(inner.trial_started, now) {
                    inner.trial_started = Some(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Whether a request would currently be permitted, without consuming the
    /// half-open trial
    pub fn allows_requests(&self) -> bool {
        let now = self.clock.now();
        let inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => self.timeout_elapsed(inner.last_failure, now),
            CircuitState::HalfOpen => {
                inner.trial_started.is_none() || self.timeout_elapsed(inner.trial_started, now)
            }
        }
    }

    /// Record a successful request
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                debug!(breaker = %self.name, "Circuit breaker transitioning from HalfOpen to Closed");
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.trial_started = None;
            }
            CircuitState::Open => {
                // Late success from a call issued before the circuit opened
                debug!(breaker = %self.name, "Ignoring success reported while circuit is open");
            }
        }
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure = Some(now);

        match inner.state {
            CircuitState::Closed => {
                if inner.failure_count >= self.threshold() {
                    warn!(
                        breaker = %self.name,
                        failures = inner.failure_count,
                        "Circuit breaker opening after consecutive failures"
                    );
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                debug!(breaker = %self.name, "Circuit breaker transitioning from HalfOpen to Open due to failure");
                inner.state = CircuitState::Open;
                inner.trial_started = None;
            }
            CircuitState::Open => {}
        }
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Consecutive failures since the last success
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        CircuitBreakerMetrics {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure: inner.last_failure,
            trial_in_flight: inner.trial_started.is_some(),
        }
    }

    /// Get the breaker configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Reset the circuit breaker to Closed
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
        inner.trial_started = None;
        debug!(breaker = %self.name, "Circuit breaker reset");
    }
}
