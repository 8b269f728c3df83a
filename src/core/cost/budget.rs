//! Budget guard
//!
//! Records usage into the ledger, answers budget checks from the ledger's
//! period accumulators, and evaluates spending alerts after every record.

use super::alerts::{Notifier, TracingNotifier};
use super::ledger::UsageLedger;
use super::optimizer::{Recommendation, optimization_recommendations};
use super::types::{BudgetAlert, BudgetPeriod, CostSummary, FiredAlert, UsageRecord};
use crate::config::BudgetConfig;
use crate::utils::error::{GatewayError, Result};
use crate::utils::time::SharedClock;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Spending limits, usage ledger and alerts
#[derive(Debug)]
pub struct BudgetGuard {
    ledger: RwLock<UsageLedger>,
    budgets: RwLock<HashMap<BudgetPeriod, f64>>,
    alerts: RwLock<Vec<BudgetAlert>>,
    notifier: Arc<dyn Notifier>,
    clock: SharedClock,
}

impl BudgetGuard {
    /// Create an empty guard with the given ledger capacity
    pub fn new(ledger_capacity: usize, notifier: Arc<dyn Notifier>, clock: SharedClock) -> Self {
        Self {
            ledger: RwLock::new(UsageLedger::new(ledger_capacity)),
            budgets: RwLock::new(HashMap::new()),
            alerts: RwLock::new(Vec::new()),
            notifier,
            clock,
        }
    }

    /// Create a guard from configuration
    pub fn from_config(
        config: &BudgetConfig,
        notifier: Arc<dyn Notifier>,
        clock: SharedClock,
    ) -> Self {
        let guard = Self::new(config.ledger_capacity, notifier, clock);
        guard.budgets.write().extend(config.budgets.iter().map(|(p, a)| (*p, *a)));
        guard.alerts.write().extend(config.alerts.iter().cloned());
        guard
    }

    /// Create a guard that only logs fired alerts
    pub fn with_tracing_notifier(ledger_capacity: usize, clock: SharedClock) -> Self {
        Self::new(ledger_capacity, Arc::new(TracingNotifier), clock)
    }

    /// Set the spending limit for a period
    pub fn set_budget(&self, period: BudgetPeriod, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(GatewayError::validation(format!(
                "Budget for {} must be a non-negative amount, got {}",
                period, amount
            )));
        }
        info!("Setting {} budget to ${:.4}", period, amount);
        self.budgets.write().insert(period, amount);
        Ok(())
    }

    /// Remove the spending limit for a period (unlimited afterwards)
    pub fn clear_budget(&self, period: BudgetPeriod) -> Option<f64> {
        self.budgets.write().remove(&period)
    }

    /// Configured limit for a period
    pub fn budget(&self, period: BudgetPeriod) -> Option<f64> {
        self.budgets.read().get(&period).copied()
    }

    /// Add an alert, replacing any alert with the same id
    pub fn add_budget_alert(&self, alert: BudgetAlert) -> Result<()> {
        if alert.threshold.is_none() && alert.threshold_percent.is_none() {
            return Err(GatewayError::validation(format!(
                "Alert '{}' needs a threshold or threshold_percent",
                alert.id
            )));
        }
        let mut alerts = self.alerts.write();
        alerts.retain(|existing| existing.id != alert.id);
        alerts.push(alert);
        Ok(())
    }

    /// Remove an alert by id
    pub fn remove_budget_alert(&self, alert_id: &str) -> bool {
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|alert| alert.id != alert_id);
        alerts.len() != before
    }

    /// Snapshot of the configured alerts
    pub fn alerts(&self) -> Vec<BudgetAlert> {
        self.alerts.read().clone()
    }

    /// Spending in the current period
    pub fn current_spending(&self, period: BudgetPeriod) -> f64 {
        self.ledger.read().current_spending(period, self.clock.now())
    }

    /// Whether `additional_cost` still fits the period budget
    ///
    /// A period without a budget is unlimited.
    pub fn is_within_budget(&self, period: BudgetPeriod, additional_cost: f64) -> bool {
        match self.budget(period) {
            None => true,
            Some(budget) => self.current_spending(period) + additional_cost <= budget,
        }
    }

    /// Whether `additional_cost` fits every configured budget
    pub fn is_within_all_budgets(&self, additional_cost: f64) -> bool {
        self.first_exceeded_budget(additional_cost).is_none()
    }

    /// The first period whose budget `additional_cost` would exceed
    pub fn first_exceeded_budget(&self, additional_cost: f64) -> Option<BudgetPeriod> {
        BudgetPeriod::ALL
            .into_iter()
            .find(|period| !self.is_within_budget(*period, additional_cost))
    }

    /// Record one usage event
    ///
    /// Returns the alerts that fired. Notifier failures are logged and do not
    /// fail the recording.
    pub async fn record_usage(&self, mut record: UsageRecord) -> Result<Vec<FiredAlert>> {
        let now = self.clock.now();
        let id = *record.id.get_or_insert_with(Uuid::new_v4);
        let timestamp = *record.timestamp.get_or_insert(now);
        record.usage.normalize();
        record.cost.normalize();

        if !record.cost.total_cost.is_finite() || record.cost.total_cost < 0.0 {
            return Err(GatewayError::Cost(format!(
                "Usage record {} has invalid cost {}",
                id, record.cost.total_cost
            )));
        }

        debug!(
            "Recording usage {} for {}/{}: ${:.6}",
            id, record.provider_id, record.model_id, record.cost.total_cost
        );

        let spending: HashMap<BudgetPeriod, f64> = {
            let mut ledger = self.ledger.write();
            ledger.append(record, timestamp, now);
            BudgetPeriod::ALL
                .into_iter()
                .map(|period| (period, ledger.current_spending(period, now)))
                .collect()
        };

        let fired = self.evaluate_alerts(&spending, now);
        Ok(self.dispatch(&fired).await)
    }

    fn evaluate_alerts(
        &self,
        spending: &HashMap<BudgetPeriod, f64>,
        now: DateTime<Utc>,
    ) -> Vec<(BudgetAlert, FiredAlert)> {
        let budgets = self.budgets.read().clone();
        let mut alerts = self.alerts.write();
        let mut fired = Vec::new();

        for alert in alerts.iter_mut().filter(|alert| alert.enabled) {
            let budget = budgets.get(&alert.period).copied();
            let Some(threshold) = alert.threshold_amount(budget) else {
                continue;
            };
            let current = spending.get(&alert.period).copied().unwrap_or(0.0);
            if current < threshold || alert.triggered_in_period(now) {
                continue;
            }

            alert.last_triggered = Some(now);
            warn!(
                "Budget alert '{}' fired: {} spending ${:.4} reached threshold ${:.4}",
                alert.id, alert.period, current, threshold
            );
            let context = FiredAlert {
                alert_id: alert.id.clone(),
                alert_name: alert.name.clone(),
                period: alert.period,
                threshold,
                current_spending: current,
                budget,
                fired_at: now,
                actions: alert.actions.clone(),
            };
            fired.push((alert.clone(), context));
        }
        fired
    }

    async fn dispatch(&self, fired: &[(BudgetAlert, FiredAlert)]) -> Vec<FiredAlert> {
        let mut contexts = Vec::with_capacity(fired.len());
        for (alert, context) in fired {
            for action in &alert.actions {
                if let Err(e) = self.notifier.notify(action, alert, context).await {
                    warn!(
                        "Notifier '{}' failed for alert '{}' action {:?}: {}",
                        self.notifier.name(),
                        alert.id,
                        action,
                        e
                    );
                }
            }
            contexts.push(context.clone());
        }
        contexts
    }

    /// Aggregate recorded usage with `start < timestamp < end`
    pub fn get_cost_summary(
        &self,
        period: BudgetPeriod,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CostSummary {
        self.ledger.read().summarize(period, start, end)
    }

    /// Summary of the current period so far
    pub fn current_period_summary(&self, period: BudgetPeriod) -> CostSummary {
        let now = self.clock.now();
        let start = period.period_start(now) - chrono::Duration::nanoseconds(1);
        self.get_cost_summary(period, start, now + chrono::Duration::nanoseconds(1))
    }

    /// Advisory cost hints for a summary
    pub fn optimization_recommendations(&self, summary: &CostSummary) -> Vec<Recommendation> {
        optimization_recommendations(summary)
    }

    /// Number of records currently held
    pub fn ledger_len(&self) -> usize {
        self.ledger.read().len()
    }
}
