//! Cost tracking types
//!
//! Usage records, budget periods and alerts, and the aggregated summaries
//! built from the usage ledger.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wall-clock aligned accounting window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Hourly,
    Daily,
    Monthly,
}

impl BudgetPeriod {
    pub const ALL: [BudgetPeriod; 3] = [
        BudgetPeriod::Hourly,
        BudgetPeriod::Daily,
        BudgetPeriod::Monthly,
    ];

    /// Start of the period containing `at` (UTC boundaries)
    pub fn period_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = at.date_naive();
        let start = match self {
            BudgetPeriod::Hourly => date.and_hms_opt(at.hour(), 0, 0),
            BudgetPeriod::Daily => date.and_hms_opt(0, 0, 0),
            BudgetPeriod::Monthly => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        start
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or(at)
    }

    /// Start of the period following the one containing `at`
    pub fn next_period_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.period_start(at);
        match self {
            BudgetPeriod::Hourly => start + ChronoDuration::hours(1),
            BudgetPeriod::Daily => start + ChronoDuration::days(1),
            BudgetPeriod::Monthly => {
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
                    .single()
                    .unwrap_or(start + ChronoDuration::days(31))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Hourly => "hourly",
            BudgetPeriod::Daily => "daily",
            BudgetPeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" | "hour" => Ok(BudgetPeriod::Hourly),
            "daily" | "day" => Ok(BudgetPeriod::Daily),
            "monthly" | "month" => Ok(BudgetPeriod::Monthly),
            other => Err(format!("Unknown budget period: {}", other)),
        }
    }
}

/// Token counts for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cached_tokens: u64,
    #[serde(default)]
    pub reasoning_tokens: u64,
    /// Zero means "derive from the components"
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Default::default()
        }
    }

    /// Sum of the individual components, saturating at `u64::MAX`
    pub fn component_sum(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cached_tokens)
            .saturating_add(self.reasoning_tokens)
    }

    /// Fill in `total_tokens` from the components when it was not supplied
    pub fn normalize(&mut self) {
        if self.total_tokens == 0 {
            self.total_tokens = self.component_sum();
        }
    }

    fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.cached_tokens = self.cached_tokens.saturating_add(other.cached_tokens);
        self.reasoning_tokens = self.reasoning_tokens.saturating_add(other.reasoning_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// Cost of one call in USD
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(default)]
    pub input_cost: f64,
    #[serde(default)]
    pub output_cost: f64,
    #[serde(default)]
    pub cached_cost: f64,
    #[serde(default)]
    pub reasoning_cost: f64,
    /// Zero means "derive from the components"
    #[serde(default)]
    pub total_cost: f64,
}

impl CostBreakdown {
    pub fn new(input_cost: f64, output_cost: f64) -> Self {
        Self {
            input_cost,
            output_cost,
            ..Default::default()
        }
    }

    /// Sum of the individual components
    pub fn component_sum(&self) -> f64 {
        self.input_cost + self.output_cost + self.cached_cost + self.reasoning_cost
    }

    /// Fill in `total_cost` from the components when it was not supplied
    pub fn normalize(&mut self) {
        if self.total_cost == 0.0 {
            self.total_cost = self.component_sum();
        }
    }
}

/// One reported call, as kept in the usage ledger
///
/// `id` and `timestamp` are assigned on recording when absent. Once in the
/// ledger a record is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub provider_id: String,
    pub model_id: String,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub cost: CostBreakdown,
    /// Call latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl UsageRecord {
    /// A successful call with the given usage and cost
    pub fn new(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        usage: TokenUsage,
        cost: CostBreakdown,
    ) -> Self {
        Self {
            id: None,
            timestamp: None,
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            usage,
            cost,
            latency_ms: 0,
            success: true,
            error: None,
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Mark the call as failed
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Aggregated usage for one model or provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageBreakdown {
    pub requests: u64,
    pub successful_requests: u64,
    pub tokens: TokenUsage,
    pub input_cost: f64,
    pub total_cost: f64,
    pub cost_per_token: f64,
    pub cost_per_request: f64,
}

impl UsageBreakdown {
    pub(crate) fn add(&mut self, record: &UsageRecord) {
        self.requests += 1;
        if record.success {
            self.successful_requests += 1;
        }
        self.tokens.accumulate(&record.usage);
        self.input_cost += record.cost.input_cost;
        self.total_cost += record.cost.total_cost;
    }

    pub(crate) fn finish(&mut self) {
        self.cost_per_token = if self.tokens.total_tokens > 0 {
            self.total_cost / self.tokens.total_tokens as f64
        } else {
            0.0
        };
        self.cost_per_request = if self.requests > 0 {
            self.total_cost / self.requests as f64
        } else {
            0.0
        };
    }

    /// Average input tokens per request
    pub fn average_input_tokens(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.tokens.input_tokens as f64 / self.requests as f64
        }
    }
}

/// Usage aggregated over a time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub period: BudgetPeriod,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub tokens: TokenUsage,
    pub total_cost: f64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
    pub model_breakdown: HashMap<String, UsageBreakdown>,
    pub provider_breakdown: HashMap<String, UsageBreakdown>,
}

impl CostSummary {
    pub(crate) fn empty(period: BudgetPeriod, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            period,
            start,
            end,
            total_requests: 0,
            successful_requests: 0,
            tokens: TokenUsage::default(),
            total_cost: 0.0,
            success_rate: 0.0,
            average_latency_ms: 0.0,
            model_breakdown: HashMap::new(),
            provider_breakdown: HashMap::new(),
        }
    }

    pub(crate) fn add(&mut self, record: &UsageRecord) {
        self.total_requests += 1;
        if record.success {
            self.successful_requests += 1;
        }
        self.tokens.accumulate(&record.usage);
        self.total_cost += record.cost.total_cost;
        let n = self.total_requests as f64;
        self.average_latency_ms += (record.latency_ms as f64 - self.average_latency_ms) / n;

        self.model_breakdown
            .entry(record.model_id.clone())
            .or_default()
            .add(record);
        self.provider_breakdown
            .entry(record.provider_id.clone())
            .or_default()
            .add(record);
    }

    pub(crate) fn finish(&mut self) {
        self.success_rate = if self.total_requests > 0 {
            self.successful_requests as f64 / self.total_requests as f64
        } else {
            0.0
        };
        self.model_breakdown.values_mut().for_each(UsageBreakdown::finish);
        self.provider_breakdown
            .values_mut()
            .for_each(UsageBreakdown::finish);
    }
}

/// What to do when a budget alert fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    Notify,
    SlowDown,
    SwitchModel,
    StopRequests,
    /// Email the given address
    Email(String),
    /// Call the given webhook URL
    Webhook(String),
}

/// Spending alert on one budget period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub period: BudgetPeriod,
    /// Absolute spending threshold in USD
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Threshold as a percentage (0-100) of the period budget
    #[serde(default)]
    pub threshold_percent: Option<f64>,
    #[serde(default = "crate::config::default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: Vec<AlertAction>,
}

impl BudgetAlert {
    /// Alert when period spending reaches `amount`
    pub fn absolute(id: impl Into<String>, period: BudgetPeriod, amount: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            period,
            threshold: Some(amount),
            threshold_percent: None,
            enabled: true,
            last_triggered: None,
            actions: vec![AlertAction::Notify],
        }
    }

    /// Alert when period spending reaches `percent` of the period budget
    pub fn percent(id: impl Into<String>, period: BudgetPeriod, percent: f64) -> Self {
        Self {
            threshold: None,
            threshold_percent: Some(percent),
            ..Self::absolute(id, period, 0.0)
        }
    }

    pub fn with_actions(mut self, actions: Vec<AlertAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Spending level at which this alert fires, given the period budget
    ///
    /// An absolute threshold takes precedence. A percentage threshold
    /// without a budget never fires.
    pub fn threshold_amount(&self, budget: Option<f64>) -> Option<f64> {
        match (self.threshold, self.threshold_percent, budget) {
            (Some(amount), _, _) => Some(amount),
            (None, Some(percent), Some(budget)) => Some(budget * percent / 100.0),
            _ => None,
        }
    }

    /// Whether the alert already fired in the period containing `now`
    pub fn triggered_in_period(&self, now: DateTime<Utc>) -> bool {
        self.last_triggered
            .is_some_and(|at| at >= self.period.period_start(now))
    }
}

/// An alert that fired while recording usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredAlert {
    pub alert_id: String,
    pub alert_name: String,
    pub period: BudgetPeriod,
    pub threshold: f64,
    pub current_spending: f64,
    pub budget: Option<f64>,
    pub fired_at: DateTime<Utc>,
    pub actions: Vec<AlertAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_starts() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 12).unwrap();

        assert_eq!(
            BudgetPeriod::Hourly.period_start(at),
            Utc.with_ymd_and_hms(2024, 3, 15, 13, 0, 0).unwrap()
        );
        assert_eq!(
            BudgetPeriod::Daily.period_start(at),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            BudgetPeriod::Monthly.period_start(at),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_month_wraps_year() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(
            BudgetPeriod::Monthly.next_period_start(at),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_totals_derived_from_components() {
        let mut usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
            cached_tokens: 10,
            reasoning_tokens: 5,
            total_tokens: 0,
        };
        usage.normalize();
        assert_eq!(usage.total_tokens, 165);

        let mut cost = CostBreakdown {
            input_cost: 0.01,
            output_cost: 0.02,
            cached_cost: 0.0,
            reasoning_cost: 0.005,
            total_cost: 0.0,
        };
        cost.normalize();
        assert!((cost.total_cost - 0.035).abs() < 1e-12);
    }

    #[test]
    fn test_supplied_totals_are_kept() {
        let mut usage = TokenUsage {
            total_tokens: 999,
            ..TokenUsage::new(1, 1)
        };
        usage.normalize();
        assert_eq!(usage.total_tokens, 999);
    }

    #[test]
    fn test_token_counts_saturate() {
        let mut usage = TokenUsage::new(u64::MAX, 10);
        usage.normalize();
        assert_eq!(usage.total_tokens, u64::MAX);

        let mut total = TokenUsage::new(u64::MAX - 1, 0);
        total.accumulate(&TokenUsage::new(5, 5));
        assert_eq!(total.input_tokens, u64::MAX);
        assert_eq!(total.output_tokens, 5);
    }

    #[test]
    fn test_alert_threshold_amount() {
        let absolute = BudgetAlert::absolute("a", BudgetPeriod::Daily, 50.0);
        assert_eq!(absolute.threshold_amount(None), Some(50.0));

        let percent = BudgetAlert::percent("p", BudgetPeriod::Daily, 80.0);
        assert_eq!(percent.threshold_amount(Some(200.0)), Some(160.0));
        assert_eq!(percent.threshold_amount(None), None);
    }

    #[test]
    fn test_alert_actions_from_yaml() {
        let yaml = r#"
id: daily-80
period: daily
threshold_percent: 80
actions:
  - notify
  - email: ops@example.com
  - webhook: https://hooks.example.com/budget
"#;
        let alert: BudgetAlert = serde_yaml::from_str(yaml).unwrap();
        assert!(alert.enabled);
        assert_eq!(alert.threshold_percent, Some(80.0));
        assert_eq!(
            alert.actions,
            vec![
                AlertAction::Notify,
                AlertAction::Email("ops@example.com".to_string()),
                AlertAction::Webhook("https://hooks.example.com/budget".to_string()),
            ]
        );
    }
}
