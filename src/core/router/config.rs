//! Routing strategy definitions
//!
//! The strategy set is closed. Names coming from configuration or callers are
//! parsed leniently: anything unrecognized routes round-robin.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Routing strategy enumeration
///
/// ## Strategies
///
/// - **RoundRobin**: Cycle through the eligible set (default)
/// - **LeastLatency**: Lowest observed average latency
/// - **LowestCost**: Lowest effective cost (price, load and health penalty)
/// - **WeightedRoundRobin**: Smooth weighted round robin on provider weight
/// - **LeastConnections**: Fewest in-flight requests
/// - **Random**: Uniform random choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoutingStrategy {
    /// Cycle through the eligible set
    #[default]
    RoundRobin,
    /// Lowest observed average latency
    LeastLatency,
    /// Lowest effective cost
    LowestCost,
    /// Smooth weighted round robin
    WeightedRoundRobin,
    /// Fewest in-flight requests
    LeastConnections,
    /// Uniform random choice
    Random,
}

impl RoutingStrategy {
    /// All strategies, in declaration order
    pub const ALL: [RoutingStrategy; 6] = [
        RoutingStrategy::RoundRobin,
        RoutingStrategy::LeastLatency,
        RoutingStrategy::LowestCost,
        RoutingStrategy::WeightedRoundRobin,
        RoutingStrategy::LeastConnections,
        RoutingStrategy::Random,
    ];

    /// Canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingStrategy::RoundRobin => "round_robin",
            RoutingStrategy::LeastLatency => "least_latency",
            RoutingStrategy::LowestCost => "lowest_cost",
            RoutingStrategy::WeightedRoundRobin => "weighted_round_robin",
            RoutingStrategy::LeastConnections => "least_connections",
            RoutingStrategy::Random => "random",
        }
    }

    /// Parse a strategy name, falling back to round robin for unknown names
    pub fn from_name(name: &str) -> Self {
        match name.parse() {
            Ok(strategy) => strategy,
            Err(unknown) => {
                warn!(
                    "Unknown routing strategy '{}', falling back to round_robin",
                    unknown
                );
                RoutingStrategy::RoundRobin
            }
        }
    }
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RoutingStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

impl From<String> for RoutingStrategy {
    fn from(name: String) -> Self {
        RoutingStrategy::from_name(&name)
    }
}

impl From<RoutingStrategy> for String {
    fn from(strategy: RoutingStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
