use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-instance rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained calls per second
    #[serde(default = "default_qps")]
    pub qps: u32,
    /// Bucket capacity (defaults to `qps`)
    #[serde(default)]
    pub burst: Option<u32>,
}

fn default_qps() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            qps: default_qps(),
            burst: None,
        }
    }
}

impl RateLimitConfig {
    /// Config with capacity equal to the rate
    pub fn per_second(qps: u32) -> Self {
        Self { qps, burst: None }
    }

    /// Time to refill one token
    pub fn refill_period(&self) -> Duration {
        Duration::from_secs(1) / self.qps.max(1)
    }

    /// Get burst size (defaults to qps if not specified)
    pub fn burst_size(&self) -> u32 {
        self.burst.unwrap_or(self.qps)
    }
}
