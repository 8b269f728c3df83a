//! Strategy dispatch over an eligible candidate set

use super::config::RoutingStrategy;
use super::strategy_impl::{
    Candidate, candidate_set_key, least_connections, least_latency, lowest_cost, random,
    round_robin, weighted_round_robin,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use tracing::debug;

/// Load balancer
///
/// Owns the cursors the stateful strategies need; everything else is a pure
/// function of the candidate set.
#[derive(Debug, Default)]
pub struct LoadBalancer {
    /// Round-robin counters keyed by candidate-set identity
    round_robin_counters: DashMap<String, AtomicUsize>,
    /// Smooth weighted round-robin scores keyed by candidate-set identity
    weighted_scores: Mutex<HashMap<String, HashMap<String, i64>>>,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick one candidate with `strategy`
    ///
    /// Candidates are ordered by id before dispatch, so the result does not
    /// depend on the caller's ordering. Cursors are keyed by the candidate
    /// set itself.
    pub fn select(&self, strategy: RoutingStrategy, candidates: &[Candidate]) -> Option<String> {
        let ordered = ordered(candidates);
        let set_key = candidate_set_key(&ordered);
        self.dispatch(strategy, &set_key, ordered)
    }

    /// Pick one candidate, keeping cursor state under `set_key`
    ///
    /// The router passes the key of the set the caller asked for, so health
    /// flapping within that set reuses one cursor instead of creating one
    /// per eligible subset.
    pub fn select_keyed(
        &self,
        strategy: RoutingStrategy,
        set_key: &str,
        candidates: &[Candidate],
    ) -> Option<String> {
        self.dispatch(strategy, set_key, ordered(candidates))
    }

    /// Number of candidate sets with cursor state
    pub fn tracked_sets(&self) -> usize {
        let weighted = self.weighted_scores.lock();
        let extra = weighted
            .keys()
            .filter(|key| !self.round_robin_counters.contains_key(*key))
            .count();
        self.round_robin_counters.len() + extra
    }

    fn dispatch(
        &self,
        strategy: RoutingStrategy,
        set_key: &str,
        mut ordered: Vec<Candidate>,
    ) -> Option<String> {
        let index = match strategy {
            RoutingStrategy::RoundRobin => {
                round_robin(set_key, &ordered, &self.round_robin_counters)
            }
            RoutingStrategy::LeastLatency => least_latency(&ordered),
            RoutingStrategy::LowestCost => lowest_cost(&ordered),
            RoutingStrategy::WeightedRoundRobin => weighted_round_robin(
                set_key,
                &ordered,
                &self.weighted_scores,
                &self.round_robin_counters,
            ),
            RoutingStrategy::LeastConnections => least_connections(&ordered),
            RoutingStrategy::Random => random(&ordered),
        }?;

        let selected = ordered.swap_remove(index).id;
        debug!(
            "Strategy {} selected {} from [{}]",
            strategy, selected, set_key
        );
        Some(selected)
    }

    /// Forget all cursor state
    pub fn reset(&self) {
        self.round_robin_counters.clear();
        self.weighted_scores.lock().clear();
    }
}

fn ordered(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut ordered = candidates.to_vec();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));
    ordered.dedup_by(|a, b| a.id == b.id);
    ordered
}
