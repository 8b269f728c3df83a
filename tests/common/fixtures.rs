//! Test fixtures and factories

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use provider_router::config::{GatewayConfig, ProviderConfig, RateLimitSettings};
use provider_router::{
    AlertAction, BudgetAlert, FiredAlert, ManualClock, Notifier, ProviderRouter, Result,
};
use std::sync::Arc;
use std::time::Duration;

/// Fixed start time: mid-morning, mid-month, so hour/day/month boundaries are far away
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 12, 9, 15, 0).unwrap()
}

/// Provider with no rate limits
pub fn provider(id: &str) -> ProviderConfig {
    ProviderConfig::new(id)
        .with_base_url(format!("https://{}.example.com", id))
        .with_rate_limit(RateLimitSettings::unlimited())
}

/// Notifier that keeps every fired action
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(String, AlertAction, f64)>>,
}

impl RecordingNotifier {
    pub fn alert_ids(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(id, _, _)| id.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        action: &AlertAction,
        alert: &BudgetAlert,
        context: &FiredAlert,
    ) -> Result<()> {
        self.calls
            .lock()
            .push((alert.id.clone(), action.clone(), context.current_spending));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Router wired to a manual clock and a recording notifier
pub struct TestRouter {
    pub router: Arc<ProviderRouter>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestRouter {
    pub fn new(config: &GatewayConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let notifier = Arc::new(RecordingNotifier::default());
        let router = Arc::new(ProviderRouter::with_parts(
            config,
            clock.clone(),
            notifier.clone(),
        ));
        Self {
            router,
            clock,
            notifier,
        }
    }

    pub fn with_providers(ids: &[&str]) -> Self {
        let config = GatewayConfig {
            providers: ids.iter().map(|id| provider(id)).collect(),
            ..GatewayConfig::default()
        };
        Self::new(&config)
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}
