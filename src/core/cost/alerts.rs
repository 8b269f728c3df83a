//! Budget alert dispatch
//!
//! The budget guard decides that an alert fired; a [`Notifier`] carries each
//! of its actions out. Transports (mail, webhooks) live outside this crate.

use super::types::{AlertAction, BudgetAlert, FiredAlert};
use crate::utils::error::Result;
use tracing::warn;

/// Receiver for fired budget alert actions
#[async_trait::async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Carry out one action of a fired alert
    async fn notify(&self, action: &AlertAction, alert: &BudgetAlert, context: &FiredAlert)
    -> Result<()>;

    /// Notifier name for logs
    fn name(&self) -> &str;
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        action: &AlertAction,
        alert: &BudgetAlert,
        context: &FiredAlert,
    ) -> Result<()> {
        warn!(
            alert_id = %alert.id,
            period = %context.period,
            spending = context.current_spending,
            threshold = context.threshold,
            ?action,
            "Budget alert '{}' fired",
            alert.name
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
