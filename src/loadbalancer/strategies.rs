use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Strategy names accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    RoundRobin,
    Random,
}

/// Load balancing strategy
#[derive(Debug, Clone)]
pub enum LoadBalancingStrategy {
    /// Round-robin: cycle through instances in pool order
    RoundRobin(RoundRobinStrategy),
    /// Random: pick a uniformly random instance
    Random,
}

impl LoadBalancingStrategy {
    pub fn from_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::RoundRobin => LoadBalancingStrategy::RoundRobin(RoundRobinStrategy::new()),
            StrategyKind::Random => LoadBalancingStrategy::Random,
        }
    }

    /// Select an index into a pool of `len` instances
    pub fn select(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        match self {
            LoadBalancingStrategy::RoundRobin(strategy) => Some(strategy.select(len)),
            LoadBalancingStrategy::Random => Some(rand::thread_rng().gen_range(0..len)),
        }
    }
}

impl Default for LoadBalancingStrategy {
    fn default() -> Self {
        LoadBalancingStrategy::RoundRobin(RoundRobinStrategy::new())
    }
}

/// Round-robin strategy state
#[derive(Debug, Clone)]
pub struct RoundRobinStrategy {
    counter: Arc<AtomicUsize>,
}

impl RoundRobinStrategy {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    // Wrapping on overflow keeps the cursor valid; only the position in the
    // cycle jumps once every usize::MAX calls.
    fn select(&self, len: usize) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed) % len
    }
}

impl Default for RoundRobinStrategy {
    fn default() -> Self {
        Self::new()
    }
}
