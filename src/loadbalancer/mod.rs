pub mod pool;
pub mod strategies;

use crate::error::{ProxyError, Result};
pub use pool::{InstancePool, PoolMember};
use std::sync::Arc;
pub use strategies::{LoadBalancingStrategy, RoundRobinStrategy, StrategyKind};
use tracing::debug;

/// Load balancer selecting the next instance endpoint from a fixed pool
pub struct LoadBalancer<Req, Resp> {
    /// Instances to choose from
    pool: Arc<InstancePool<Req, Resp>>,
    /// Load balancing strategy
    strategy: LoadBalancingStrategy,
}

impl<Req, Resp> LoadBalancer<Req, Resp> {
    /// Create a new load balancer
    pub fn new(pool: InstancePool<Req, Resp>, strategy: LoadBalancingStrategy) -> Self {
        Self {
            pool: Arc::new(pool),
            strategy,
        }
    }

    /// Round-robin load balancer
    pub fn round_robin(pool: InstancePool<Req, Resp>) -> Self {
        Self::new(pool, LoadBalancingStrategy::default())
    }

    /// Select the member for the next call
    pub fn next(&self) -> Result<&PoolMember<Req, Resp>> {
        let member = self
            .strategy
            .select(self.pool.len())
            .and_then(|index| self.pool.get(index))
            .ok_or(ProxyError::NoEndpoints)?;

        debug!(instance = %member.name(), "Selected instance");
        Ok(member)
    }

    pub fn pool(&self) -> &InstancePool<Req, Resp> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::endpoint_fn;

    fn create_test_pool(names: &[&str]) -> InstancePool<String, String> {
        let members = names
            .iter()
            .map(|name| {
                let tag = name.to_string();
                PoolMember::new(
                    *name,
                    Arc::new(endpoint_fn(move |_s: String| {
                        let tag = tag.clone();
                        async move { Ok::<_, ProxyError>(tag) }
                    })) as crate::endpoint::BoxEndpoint<String, String>,
                )
            })
            .collect();
        InstancePool::new(members).unwrap()
    }

    #[test]
    fn test_round_robin_distribution() {
        let lb = LoadBalancer::round_robin(create_test_pool(&["a", "b", "c"]));

        let picks: Vec<String> = (0..4)
            .map(|_| lb.next().unwrap().name().to_string())
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_first_pick_calls_first_instance() {
        let lb = LoadBalancer::round_robin(create_test_pool(&["a", "b", "c"]));

        let member = lb.next().unwrap();
        let response = member.endpoint().call("x".to_string(), None).await.unwrap();
        assert_eq!(response, "a");
    }

    #[test]
    fn test_single_instance_repeats() {
        let lb = LoadBalancer::round_robin(create_test_pool(&["only"]));
        for _ in 0..5 {
            assert_eq!(lb.next().unwrap().name(), "only");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_selection_is_fair() {
        let lb = Arc::new(LoadBalancer::round_robin(create_test_pool(&["a", "b", "c", "d"])));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lb = lb.clone();
            handles.push(tokio::spawn(async move {
                (0..100)
                    .map(|_| lb.next().unwrap().name().to_string())
                    .collect::<Vec<_>>()
            }));
        }

        let mut counts = std::collections::HashMap::new();
        for handle in handles {
            for name in handle.await.unwrap() {
                *counts.entry(name).or_insert(0) += 1;
            }
        }

        // 800 atomic increments over 4 slots land exactly 200 on each
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 200));
    }
}
