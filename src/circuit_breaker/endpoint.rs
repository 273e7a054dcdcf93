use super::breaker::{CircuitBreaker, Permit};
use crate::endpoint::{BoxEndpoint, Endpoint};
use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;

/// Endpoint guarded by a circuit breaker
pub struct CircuitBreakerEndpoint<Req, Resp> {
    breaker: Arc<CircuitBreaker>,
    inner: BoxEndpoint<Req, Resp>,
}

impl<Req, Resp> CircuitBreakerEndpoint<Req, Resp> {
    pub fn new(breaker: Arc<CircuitBreaker>, inner: BoxEndpoint<Req, Resp>) -> Self {
        Self { breaker, inner }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

#[async_trait]
impl<Req, Resp> Endpoint<Req, Resp> for CircuitBreakerEndpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req, deadline: Option<Instant>) -> Result<Resp> {
        let permit = self
            .breaker
            .try_acquire()
            .ok_or_else(|| ProxyError::CircuitOpen(self.breaker.instance().to_string()))?;

        let outcome = Outcome::new(&self.breaker, permit);
        let result = self.inner.call(request, deadline).await;
        match &result {
            Ok(_) => outcome.success(),
            Err(_) => outcome.failure(),
        }
        result
    }
}

/// Reports the outcome of an admitted call. If the call future is dropped
/// before completing, the call is recorded as abandoned.
struct Outcome<'a> {
    breaker: &'a CircuitBreaker,
    permit: Permit,
    reported: bool,
}

impl<'a> Outcome<'a> {
    fn new(breaker: &'a CircuitBreaker, permit: Permit) -> Self {
        Self {
            breaker,
            permit,
            reported: false,
        }
    }

    fn success(mut self) {
        self.reported = true;
        self.breaker.record_success(self.permit);
    }

    fn failure(mut self) {
        self.reported = true;
        self.breaker.record_failure(self.permit);
    }
}

impl Drop for Outcome<'_> {
    fn drop(&mut self) {
        if !self.reported {
            self.breaker.record_abandoned(self.permit);
        }
    }
}
