//! Provider registry and selection API
//!
//! The registry owns every provider record and composes the health, circuit
//! breaker, rate limiter and budget gates in front of the load balancer.
//!
//! Locking: provider records sit behind one `RwLock`; each breaker and each
//! rate-limit window has its own lock. Selection holds the provider lock only
//! while building the candidate list.

use super::config::RoutingStrategy;
use super::load_balancer::LoadBalancer;
use super::provider::{ProviderRecord, ProviderSnapshot};
use super::strategy_impl::Candidate;
use crate::config::{GatewayConfig, HealthConfig, ProviderConfig, RouterConfig};
use crate::core::cost::{
    BudgetGuard, CostBreakdown, FiredAlert, Notifier, TokenUsage, TracingNotifier, UsageRecord,
};
use crate::core::fallback::FallbackCoordinator;
use crate::core::health::{HealthCheckResult, HealthStatus, SystemHealth};
use crate::core::rate_limiter::{RateLimiter, RequestId};
use crate::utils::error::{CircuitBreaker, GatewayError, Result};
use crate::utils::time::{SharedClock, SystemClock};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of one provider call, as reported by the caller
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub provider_id: String,
    pub model_id: String,
    pub latency: Duration,
    pub success: bool,
    pub error: Option<String>,
    /// Token usage and cost, when the call produced any
    pub usage: Option<(TokenUsage, CostBreakdown)>,
    /// In-flight request this call was admitted as; without one the
    /// provider's oldest in-flight request is completed
    pub request_id: Option<RequestId>,
}

impl CallOutcome {
    pub fn success(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            latency,
            success: true,
            error: None,
            usage: None,
            request_id: None,
        }
    }

    pub fn failure(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        latency: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success(provider_id, model_id, latency)
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage, cost: CostBreakdown) -> Self {
        self.usage = Some((usage, cost));
        self
    }

    pub fn with_request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

/// Provider registry and router
#[derive(Debug)]
pub struct ProviderRouter {
    config: RouterConfig,
    health_config: HealthConfig,
    providers: RwLock<HashMap<String, ProviderRecord>>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    rate_limiter: RateLimiter,
    budget: Arc<BudgetGuard>,
    fallback: FallbackCoordinator,
    load_balancer: LoadBalancer,
    clock: SharedClock,
}

impl ProviderRouter {
    /// Create a router on the system clock that logs fired budget alerts
    pub fn new(config: &GatewayConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(TracingNotifier))
    }

    /// Create a router with an explicit clock and alert notifier
    pub fn with_parts(
        config: &GatewayConfig,
        clock: SharedClock,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let budget = Arc::new(BudgetGuard::from_config(
            &config.budget,
            notifier,
            clock.clone(),
        ));
        let router = Self {
            config: config.router.clone(),
            health_config: config.health.clone(),
            providers: RwLock::new(HashMap::new()),
            breakers: DashMap::new(),
            rate_limiter: RateLimiter::new(clock.clone()),
            budget,
            fallback: FallbackCoordinator::from_rules(config.fallbacks.clone()),
            load_balancer: LoadBalancer::new(),
            clock,
        };
        for provider in &config.providers {
            router.upsert_provider(provider.clone());
        }
        info!(
            "Provider router initialized with {} providers, strategy {}",
            config.providers.len(),
            router.config.strategy
        );
        router
    }

    /// Router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Health thresholds
    pub fn health_config(&self) -> &HealthConfig {
        &self.health_config
    }

    /// Budget guard and usage ledger
    pub fn budget(&self) -> &Arc<BudgetGuard> {
        &self.budget
    }

    /// Fallback coordinator
    pub fn fallback(&self) -> &FallbackCoordinator {
        &self.fallback
    }

    /// Rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Clock shared by all components
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Strategy dispatcher and its cursor state
    pub fn load_balancer(&self) -> &LoadBalancer {
        &self.load_balancer
    }

    fn breaker(&self, provider_id: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.get(provider_id) {
            return breaker.clone();
        }
        self.breakers
            .entry(provider_id.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    provider_id,
                    self.config.circuit_breaker.clone(),
                    self.clock.clone(),
                ))
            })
            .clone()
    }

    /// Make sure every id has a record, instantiating missing ones from the template
    fn ensure_providers<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing: Vec<&str> = {
            let providers = self.providers.read();
            ids.into_iter()
                .filter(|id| !providers.contains_key(*id))
                .collect()
        };
        if missing.is_empty() {
            return;
        }

        let mut providers = self.providers.write();
        for id in missing {
            providers.entry(id.to_string()).or_insert_with(|| {
                debug!("Creating provider {} from default template", id);
                ProviderRecord::new(self.config.default_provider.instantiate(id))
            });
        }
    }

    /// Add a provider or replace its configuration, keeping its health
    pub fn upsert_provider(&self, config: ProviderConfig) {
        let mut providers = self.providers.write();
        match providers.get_mut(&config.id) {
            Some(record) => {
                info!("Updating provider {}", config.id);
                record.config = config;
            }
            None => {
                info!("Registering provider {}", config.id);
                providers.insert(config.id.clone(), ProviderRecord::new(config));
            }
        }
    }

    /// Put a provider into or out of maintenance
    pub fn set_maintenance(&self, provider_id: &str, maintenance: bool) {
        self.ensure_providers([provider_id]);
        if let Some(record) = self.providers.write().get_mut(provider_id) {
            record.health.set_maintenance(maintenance);
            info!(
                "Provider {} maintenance {}",
                provider_id,
                if maintenance { "enabled" } else { "disabled" }
            );
        }
    }

    /// Registered provider ids, sorted
    pub fn provider_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Point-in-time view of one provider
    pub fn provider_snapshot(&self, provider_id: &str) -> Option<ProviderSnapshot> {
        let record = self.providers.read().get(provider_id).cloned()?;
        Some(ProviderSnapshot {
            circuit: self.breaker(provider_id).metrics(),
            usage: self.rate_limiter.usage(provider_id),
            config: record.config,
            health: record.health,
        })
    }

    /// Status counts across all providers
    pub fn system_health(&self) -> SystemHealth {
        SystemHealth::from_statuses(self.providers.read().values().map(|r| r.health.status))
    }

    /// Enabled providers with a probe endpoint
    pub fn probe_targets(&self) -> Vec<(String, String)> {
        let providers = self.providers.read();
        let mut targets: Vec<(String, String)> = providers
            .values()
            .filter(|record| record.config.enabled)
            .filter_map(|record| {
                record
                    .config
                    .base_url
                    .clone()
                    .map(|url| (record.config.id.clone(), url))
            })
            .collect();
        targets.sort();
        targets
    }

    /// Fold a probe result into a provider's health
    pub fn apply_probe_result(&self, provider_id: &str, result: &HealthCheckResult) {
        let mut providers = self.providers.write();
        let Some(record) = providers.get_mut(provider_id) else {
            return;
        };
        let before = record.health.status;
        record.health.apply_probe(result, &self.health_config);
        log_transition(provider_id, before, record.health.status);
    }

    /// Whether a new request to `provider_id` fits its rate limits
    pub fn is_within_rate_limit(&self, provider_id: &str) -> bool {
        self.ensure_providers([provider_id]);
        let settings = match self.providers.read().get(provider_id) {
            Some(record) => record.config.rate_limit,
            None => return false,
        };
        self.rate_limiter.is_within_rate_limit(provider_id, &settings)
    }

    /// Select a provider from `candidates` using `strategy`
    pub fn select_provider<S: AsRef<str>>(
        &self,
        candidates: &[S],
        strategy: RoutingStrategy,
    ) -> Result<String> {
        self.select(candidates, strategy, None).map(|(id, _)| id)
    }

    /// Select a provider and return the id of the request it admitted
    ///
    /// Pass the id back through [`CallOutcome::with_request`] so the outcome
    /// completes exactly this request.
    pub fn select_request<S: AsRef<str>>(
        &self,
        candidates: &[S],
        strategy: RoutingStrategy,
        estimated_cost: Option<f64>,
    ) -> Result<(String, RequestId)> {
        self.select(candidates, strategy, estimated_cost)
    }

    /// Select a provider that can also afford a call of `estimated_cost`
    ///
    /// Each provider's cost is the estimate scaled by its cost multiplier and
    /// must fit every configured budget and the provider's per-request cap.
    pub fn select_provider_with_cost<S: AsRef<str>>(
        &self,
        candidates: &[S],
        strategy: RoutingStrategy,
        estimated_cost: f64,
    ) -> Result<String> {
        self.select(candidates, strategy, Some(estimated_cost))
            .map(|(id, _)| id)
    }

    /// Select with the configured default strategy
    pub fn select_default<S: AsRef<str>>(&self, candidates: &[S]) -> Result<String> {
        self.select(candidates, self.config.strategy, None)
            .map(|(id, _)| id)
    }

    fn select<S: AsRef<str>>(
        &self,
        candidates: &[S],
        strategy: RoutingStrategy,
        estimated_cost: Option<f64>,
    ) -> Result<(String, RequestId)> {
        let mut seen = HashSet::new();
        let ids: Vec<&str> = candidates
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| seen.insert(*id))
            .collect();
        self.ensure_providers(ids.iter().copied());
        self.lapse_stale_health(&ids);

        let mut sorted = ids.clone();
        sorted.sort_unstable();
        let set_key = sorted.join(",");

        let mut eligible = self.eligible_candidates(&ids, estimated_cost);
        let mut settings: HashMap<String, _> = {
            let providers = self.providers.read();
            eligible
                .iter()
                .filter_map(|c| providers.get(&c.id).map(|r| (c.id.clone(), r.config.rate_limit)))
                .collect()
        };

        while !eligible.is_empty() {
            let Some(selected) = self.load_balancer.select_keyed(strategy, &set_key, &eligible)
            else {
                break;
            };
            eligible.retain(|c| c.id != selected);
            let Some(limits) = settings.remove(&selected) else {
                continue;
            };

            let Some(request_id) = self.rate_limiter.try_start_request(&selected, &limits) else {
                debug!("Provider {} lost its rate-limit slot during selection", selected);
                continue;
            };
            if !self.breaker(&selected).can_request() {
                debug!("Provider {} lost its half-open trial during selection", selected);
                self.rate_limiter.cancel_request(&selected, request_id);
                continue;
            }

            debug!("Selected provider {} with strategy {}", selected, strategy);
            return Ok((selected, request_id));
        }

        warn!(
            "No healthy providers among [{}] for strategy {}",
            ids.join(","),
            strategy
        );
        Err(GatewayError::NoHealthyProviders)
    }

    /// Clear call-derived health that has gone `recovery_timeout` without a
    /// failure
    fn lapse_stale_health(&self, ids: &[&str]) {
        let now = self.clock.now();
        let stale = {
            let providers = self.providers.read();
            ids.iter().any(|id| {
                providers
                    .get(*id)
                    .is_some_and(|r| r.health.derived_expired(now, &self.health_config))
            })
        };
        if !stale {
            return;
        }

        let mut providers = self.providers.write();
        for id in ids {
            let Some(record) = providers.get_mut(*id) else {
                continue;
            };
            let before = record.health.status;
            if record.health.expire_derived(now, &self.health_config) {
                info!("Provider {} call-derived health lapsed after recovery timeout", id);
                log_transition(id, before, record.health.status);
            }
        }
    }

    fn eligible_candidates(&self, ids: &[&str], estimated_cost: Option<f64>) -> Vec<Candidate> {
        let providers = self.providers.read();
        ids.iter()
            .filter_map(|id| providers.get(*id))
            .filter(|record| self.gate(record, estimated_cost).is_ok())
            .map(|record| Candidate {
                id: record.config.id.clone(),
                priority: record.config.priority,
                weight: record.config.load_balancing.weight,
                cost_multiplier: record.config.cost.cost_multiplier,
                status: record.health.status,
                average_latency_ms: record
                    .health
                    .has_latency_samples()
                    .then_some(record.health.average_latency_ms),
                active_requests: self.rate_limiter.active_requests(record.id()),
            })
            .collect()
    }

    /// Every non-consuming gate, in order, with the error a pinned caller sees
    fn gate(&self, record: &ProviderRecord, estimated_cost: Option<f64>) -> Result<()> {
        let id = record.id();
        if !record.config.enabled {
            return Err(GatewayError::ProviderDisabled(id.to_string()));
        }
        if record.health.status == HealthStatus::Maintenance {
            return Err(GatewayError::MaintenanceMode(id.to_string()));
        }
        if !record.health.status.allows_requests(self.config.admit_degraded) {
            return Err(GatewayError::NoHealthyProviders);
        }
        if !self.breaker(id).allows_requests() {
            return Err(GatewayError::CircuitOpen(id.to_string()));
        }
        if !self
            .rate_limiter
            .is_within_rate_limit(id, &record.config.rate_limit)
        {
            return Err(GatewayError::RateLimitExceeded(id.to_string()));
        }
        if let Some(estimate) = estimated_cost {
            let cost = estimate * record.config.cost.cost_multiplier;
            if let Some(cap) = record.config.cost.max_cost_per_request {
                if cost > cap {
                    return Err(GatewayError::budget_exceeded(format!(
                        "{} request cost ${:.4} exceeds per-request cap ${:.4}",
                        id, cost, cap
                    )));
                }
            }
            if let Some(period) = self.budget.first_exceeded_budget(cost) {
                return Err(GatewayError::budget_exceeded(format!(
                    "{} budget cannot cover ${:.4} on {}",
                    period, cost, id
                )));
            }
        }
        Ok(())
    }

    /// Admit a request to one specific provider
    ///
    /// Runs every gate selection would, returning the specific denial. On
    /// success the request is recorded as in flight and, if the breaker is
    /// half-open, the trial is taken.
    pub fn authorize(&self, provider_id: &str, estimated_cost: Option<f64>) -> Result<()> {
        self.authorize_request(provider_id, estimated_cost).map(drop)
    }

    /// [`authorize`](Self::authorize), returning the admitted request's id
    pub fn authorize_request(
        &self,
        provider_id: &str,
        estimated_cost: Option<f64>,
    ) -> Result<RequestId> {
        self.ensure_providers([provider_id]);
        self.lapse_stale_health(&[provider_id]);
        let limits = {
            let providers = self.providers.read();
            let record = providers
                .get(provider_id)
                .ok_or(GatewayError::NoHealthyProviders)?;
            self.gate(record, estimated_cost)?;
            record.config.rate_limit
        };

        let request_id = self
            .rate_limiter
            .try_start_request(provider_id, &limits)
            .ok_or_else(|| GatewayError::RateLimitExceeded(provider_id.to_string()))?;
        if !self.breaker(provider_id).can_request() {
            self.rate_limiter.cancel_request(provider_id, request_id);
            return Err(GatewayError::CircuitOpen(provider_id.to_string()));
        }
        Ok(request_id)
    }

    /// Fold one call outcome into the provider's metrics
    ///
    /// Updates the running latency mean and success/error rates, forwards the
    /// result to the circuit breaker, re-derives health, and completes the
    /// oldest in-flight request.
    pub fn update_provider_metrics(
        &self,
        provider_id: &str,
        latency: Duration,
        success: bool,
        error: Option<String>,
    ) {
        self.record_call(provider_id, latency, success, error);
        self.rate_limiter.finish_oldest(provider_id);
    }

    fn record_call(
        &self,
        provider_id: &str,
        latency: Duration,
        success: bool,
        error: Option<String>,
    ) {
        self.ensure_providers([provider_id]);
        let now = self.clock.now();
        {
            let mut providers = self.providers.write();
            if let Some(record) = providers.get_mut(provider_id) {
                let before = record.health.status;
                record
                    .health
                    .record_outcome(latency, success, error, now, &self.health_config);
                log_transition(provider_id, before, record.health.status);
            }
        }

        let breaker = self.breaker(provider_id);
        if success {
            breaker.record_success();
        } else {
            breaker.record_failure();
        }
    }

    /// Report a finished call: update metrics, then record usage if any
    ///
    /// Returns the budget alerts that fired.
    pub async fn report_outcome(&self, outcome: CallOutcome) -> Result<Vec<FiredAlert>> {
        self.record_call(
            &outcome.provider_id,
            outcome.latency,
            outcome.success,
            outcome.error.clone(),
        );
        match outcome.request_id {
            Some(request_id) => {
                if !self
                    .rate_limiter
                    .finish_request(&outcome.provider_id, request_id)
                {
                    debug!(
                        "Request {} on {} was not in flight",
                        request_id, outcome.provider_id
                    );
                }
            }
            None => {
                self.rate_limiter.finish_oldest(&outcome.provider_id);
            }
        }

        let Some((usage, cost)) = outcome.usage else {
            return Ok(Vec::new());
        };
        let mut record = UsageRecord::new(outcome.provider_id, outcome.model_id, usage, cost)
            .with_latency_ms(outcome.latency.as_millis() as u64);
        if !outcome.success {
            record.success = false;
            record.error = outcome.error;
        }
        self.budget.record_usage(record).await
    }
}

fn log_transition(provider_id: &str, before: HealthStatus, after: HealthStatus) {
    if before == after {
        return;
    }
    match after {
        HealthStatus::Unhealthy | HealthStatus::Degraded => {
            warn!("Provider {} health {} -> {}", provider_id, before, after)
        }
        _ => info!("Provider {} health {} -> {}", provider_id, before, after),
    }
}
