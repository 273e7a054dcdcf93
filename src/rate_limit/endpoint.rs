use super::limiter::TokenBucket;
use crate::endpoint::{BoxEndpoint, Endpoint};
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::warn;

/// Endpoint that rejects calls once its token bucket is empty
pub struct RateLimitedEndpoint<Req, Resp> {
    instance: String,
    bucket: TokenBucket,
    inner: BoxEndpoint<Req, Resp>,
}

impl<Req, Resp> RateLimitedEndpoint<Req, Resp> {
    pub fn new(instance: impl Into<String>, bucket: TokenBucket, inner: BoxEndpoint<Req, Resp>) -> Self {
        Self {
            instance: instance.into(),
            bucket,
            inner,
        }
    }
}

#[async_trait]
impl<Req, Resp> Endpoint<Req, Resp> for RateLimitedEndpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req, deadline: Option<Instant>) -> Result<Resp> {
        if !self.bucket.try_acquire() {
            warn!(instance = %self.instance, "Rate limit exceeded");
            return Err(ProxyError::RateExceeded(self.instance.clone()));
        }

        self.inner.call(request, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::{
        CircuitBreaker, CircuitBreakerConfig, CircuitBreakerEndpoint, CircuitState,
    };
    use crate::endpoint::endpoint_fn;
    use crate::rate_limit::RateLimitConfig;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_rejects_without_calling_inner() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let inner: BoxEndpoint<String, String> = Arc::new(endpoint_fn(move |s: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ProxyError>(s)
            }
        }));
        let bucket = TokenBucket::new(RateLimitConfig {
            qps: 1,
            burst: Some(2),
        })
        .unwrap();
        let endpoint = RateLimitedEndpoint::new("a", bucket, inner);

        assert!(endpoint.call("x".to_string(), None).await.is_ok());
        assert!(endpoint.call("x".to_string(), None).await.is_ok());

        let err = endpoint.call("x".to_string(), None).await.unwrap_err();
        assert!(matches!(err, ProxyError::RateExceeded(ref name) if name == "a"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejections_do_not_trip_breaker() {
        let inner: BoxEndpoint<String, String> =
            Arc::new(endpoint_fn(|s: String| async move { Ok::<_, ProxyError>(s) }));
        let breaker = Arc::new(CircuitBreaker::new(
            "a",
            CircuitBreakerConfig {
                failure_threshold: 1,
                ..Default::default()
            },
        ));
        let guarded: BoxEndpoint<String, String> =
            Arc::new(CircuitBreakerEndpoint::new(breaker.clone(), inner));
        let bucket = TokenBucket::new(RateLimitConfig {
            qps: 1,
            burst: Some(1),
        })
        .unwrap();
        let endpoint = RateLimitedEndpoint::new("a", bucket, guarded);

        assert!(endpoint.call("x".to_string(), None).await.is_ok());
        for _ in 0..5 {
            assert!(endpoint.call("x".to_string(), None).await.is_err());
        }

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().failed_requests, 0);
    }
}
