use super::types::RateLimitConfig;
use crate::error::{ProxyError, Result};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::num::NonZeroU32;
use tracing::debug;

/// Token bucket for a single instance
///
/// Refills one token per [`RateLimitConfig::refill_period`] up to the
/// configured burst. Checks never wait: an empty bucket is a rejection.
pub struct TokenBucket {
    limiter: GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: RateLimitConfig,
}

impl TokenBucket {
    /// Create a new token bucket
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        if config.qps == 0 {
            return Err(ProxyError::Config(
                "Rate limit qps must be > 0".to_string(),
            ));
        }

        let burst = NonZeroU32::new(config.burst_size())
            .ok_or_else(|| ProxyError::Config("Rate limit burst must be > 0".to_string()))?;
        let quota = Quota::with_period(config.refill_period())
            .ok_or_else(|| ProxyError::Config(format!("Rate limit qps too high: {}", config.qps)))?
            .allow_burst(burst);

        debug!(
            qps = config.qps,
            burst = config.burst_size(),
            "Creating token bucket"
        );

        Ok(Self {
            limiter: GovernorRateLimiter::direct(quota),
            config,
        })
    }

    /// Take one token if available
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
