//! Usage ledger
//!
//! A capped, insertion-ordered log of usage records plus one spending
//! accumulator per budget period. The accumulators are what budget checks
//! read; the log backs cost summaries.

use super::types::{BudgetPeriod, CostSummary, UsageRecord};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Spending inside one wall-clock period
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PeriodSpending {
    pub(crate) start: DateTime<Utc>,
    pub(crate) amount: f64,
}

/// Capped usage log with per-period accumulators
#[derive(Debug)]
pub struct UsageLedger {
    records: VecDeque<UsageRecord>,
    capacity: usize,
    spending: HashMap<BudgetPeriod, PeriodSpending>,
}

impl UsageLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            spending: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a normalized record, evicting the oldest beyond capacity
    ///
    /// Accumulators always track the period containing `now`. A record is
    /// credited there when its timestamp falls in that period; a timestamp
    /// ahead of `now` is credited as if stamped `now`. Records from earlier
    /// periods only land in the log.
    pub(crate) fn append(&mut self, record: UsageRecord, at: DateTime<Utc>, now: DateTime<Utc>) {
        let cost = record.cost.total_cost;
        let credited_at = at.min(now);
        for period in BudgetPeriod::ALL {
            let current = period.period_start(now);
            let entry = self.spending.entry(period).or_insert(PeriodSpending {
                start: current,
                amount: 0.0,
            });
            if entry.start < current {
                *entry = PeriodSpending {
                    start: current,
                    amount: 0.0,
                };
            }
            if period.period_start(credited_at) == entry.start {
                entry.amount += cost;
            }
        }

        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Spending in the period containing `now`
    pub fn current_spending(&self, period: BudgetPeriod, now: DateTime<Utc>) -> f64 {
        match self.spending.get(&period) {
            Some(spending) if spending.start == period.period_start(now) => spending.amount,
            _ => 0.0,
        }
    }

    /// Aggregate records with `start < timestamp < end`
    pub fn summarize(
        &self,
        period: BudgetPeriod,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CostSummary {
        let mut summary = CostSummary::empty(period, start, end);
        for record in &self.records {
            if let Some(timestamp) = record.timestamp {
                if start < timestamp && timestamp < end {
                    summary.add(record);
                }
            }
        }
        summary.finish();
        summary
    }

    /// All held records, oldest first
    pub fn records(&self) -> impl Iterator<Item = &UsageRecord> {
        self.records.iter()
    }
}
