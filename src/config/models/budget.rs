//! Budget configuration

use super::*;
use crate::core::cost::{BudgetAlert, BudgetPeriod};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Spending limit per period in USD; absent periods are unlimited
    #[serde(default)]
    pub budgets: HashMap<BudgetPeriod, f64>,
    /// Alerts evaluated after every recorded usage event
    #[serde(default)]
    pub alerts: Vec<BudgetAlert>,
    /// Maximum number of usage records kept in memory
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            budgets: HashMap::new(),
            alerts: Vec::new(),
            ledger_capacity: default_ledger_capacity(),
        }
    }
}
