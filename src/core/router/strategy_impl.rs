//! Routing strategy implementations
//!
//! Each selector receives the already-filtered candidate set, sorted by id,
//! and returns the index of its pick. Ties resolve to the earliest candidate
//! so results are reproducible for a given input.

use crate::core::health::HealthStatus;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};

/// Load factor added per in-flight request when scoring cost
const LOAD_PENALTY_PER_REQUEST: f64 = 0.1;
/// Cost multiplier applied to degraded providers
const DEGRADED_COST_PENALTY: f64 = 1.5;

/// What a selector knows about one eligible provider
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub priority: u32,
    pub weight: u32,
    pub cost_multiplier: f64,
    pub status: HealthStatus,
    /// Mean latency of reported calls; `None` before the first sample
    pub average_latency_ms: Option<f64>,
    pub active_requests: u32,
}

impl Candidate {
    /// Healthy candidate with neutral scores
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            weight: 1,
            cost_multiplier: 1.0,
            status: HealthStatus::Healthy,
            average_latency_ms: None,
            active_requests: 0,
        }
    }
}

/// Effective cost score: price, scaled by load, penalized when degraded
///
/// Unhealthy (and otherwise unusable) providers have no score.
pub fn effective_cost(candidate: &Candidate) -> Option<f64> {
    let health_penalty = match candidate.status {
        HealthStatus::Healthy => 1.0,
        HealthStatus::Degraded => DEGRADED_COST_PENALTY,
        _ => return None,
    };
    let load = 1.0 + LOAD_PENALTY_PER_REQUEST * candidate.active_requests as f64;
    Some(candidate.cost_multiplier * load * health_penalty)
}

/// Identity of a candidate set, independent of input order
pub fn candidate_set_key(candidates: &[Candidate]) -> String {
    let mut ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    ids.join(",")
}

/// Round-robin selection
///
/// Cycles through the set using a counter per candidate-set identity, so a
/// fixed set of N candidates is visited once each per N calls.
pub fn round_robin(
    set_key: &str,
    candidates: &[Candidate],
    counters: &DashMap<String, AtomicUsize>,
) -> Option<usize> {
    match candidates.len() {
        0 => None,
        1 => Some(0),
        len => {
            let index = match counters.get(set_key) {
                Some(counter) => counter.fetch_add(1, Relaxed),
                None => counters
                    .entry(set_key.to_string())
                    .or_insert_with(|| AtomicUsize::new(0))
                    .fetch_add(1, Relaxed),
            };
            Some(index % len)
        }
    }
}

/// Select the candidate with the lowest average latency
///
/// Candidates without samples are scored at the mean of the measured ones.
pub fn least_latency(candidates: &[Candidate]) -> Option<usize> {
    let measured: Vec<f64> = candidates
        .iter()
        .filter_map(|c| c.average_latency_ms)
        .collect();
    let fallback = if measured.is_empty() {
        0.0
    } else {
        measured.iter().sum::<f64>() / measured.len() as f64
    };

    min_index_by(candidates, |c| c.average_latency_ms.unwrap_or(fallback))
}

/// Select the candidate with the lowest effective cost
///
/// Degraded candidates carry a 1.5x penalty, so a cheap degraded provider can
/// still beat a healthy one (0.5 x 1.5 = 0.75 against 1.0). The router only
/// offers degraded providers when `admit_degraded` is set.
pub fn lowest_cost(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| effective_cost(c).map(|cost| (i, cost)))
        .fold(None, |best: Option<(usize, f64)>, (i, cost)| match best {
            Some((_, best_cost)) if best_cost <= cost => best,
            _ => Some((i, cost)),
        })
        .map(|(i, _)| i)
}

/// Select the candidate with the fewest in-flight requests
///
/// Ties go to the lower priority value.
pub fn least_connections(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| (c.active_requests, c.priority))
        .map(|(i, _)| i)
}

/// Uniform random selection
pub fn random(candidates: &[Candidate]) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let mut rng = rand::thread_rng();
    Some(rng.gen_range(0..candidates.len()))
}

/// Smooth weighted round robin
///
/// Every call adds each candidate's weight to its running score, picks the
/// highest score and subtracts the total weight from it. Over a cycle each
/// candidate is picked in proportion to its weight, interleaved rather than
/// in bursts. Zero-weight candidates are only used when all weights are zero.
pub fn weighted_round_robin(
    set_key: &str,
    candidates: &[Candidate],
    scores: &Mutex<HashMap<String, HashMap<String, i64>>>,
    counters: &DashMap<String, AtomicUsize>,
) -> Option<usize> {
    let total: i64 = candidates.iter().map(|c| c.weight as i64).sum();
    if total == 0 {
        return round_robin(set_key, candidates, counters);
    }

    let mut scores = scores.lock();
    let set_scores = scores.entry(set_key.to_string()).or_default();
    // Candidates that dropped out start from zero when they come back
    set_scores.retain(|id, _| candidates.iter().any(|c| &c.id == id));

    let mut best: Option<(usize, i64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.weight == 0 {
            continue;
        }
        let score = set_scores.entry(candidate.id.clone()).or_insert(0);
        *score += candidate.weight as i64;
        if best.is_none_or(|(_, best_score)| *score > best_score) {
            best = Some((i, *score));
        }
    }

    let (index, _) = best?;
    if let Some(score) = set_scores.get_mut(&candidates[index].id) {
        *score -= total;
    }
    Some(index)
}

fn min_index_by<F>(candidates: &[Candidate], score: F) -> Option<usize>
where
    F: Fn(&Candidate) -> f64,
{
    candidates
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, c)| {
            let value = score(c);
            match best {
                Some((_, best_value)) if best_value <= value => best,
                _ => Some((i, value)),
            }
        })
        .map(|(i, _)| i)
}
