use super::types::RetryConfig;
use crate::endpoint::Endpoint;
use crate::error::{ProxyError, Result};
use crate::loadbalancer::LoadBalancer;
use async_trait::async_trait;
use backoff::backoff::Backoff;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What the retry loop should do after a failed attempt
#[derive(Debug)]
pub struct RetryDecision {
    /// Whether to make another attempt
    pub keep_trying: bool,
    /// Error to record in place of the one received
    pub replacement: Option<ProxyError>,
}

impl RetryDecision {
    pub fn retry() -> Self {
        Self {
            keep_trying: true,
            replacement: None,
        }
    }

    pub fn stop() -> Self {
        Self {
            keep_trying: false,
            replacement: None,
        }
    }

    pub fn with_replacement(mut self, error: ProxyError) -> Self {
        self.replacement = Some(error);
        self
    }
}

/// Called with the 1-based attempt number and the error it produced
pub type RetryCallback = Arc<dyn Fn(u32, &ProxyError) -> RetryDecision + Send + Sync>;

/// Retrying, load-balanced endpoint
///
/// Each call draws instances from the balancer one at a time until an
/// attempt succeeds or the attempt/time budget runs out. Attempts are
/// sequential; a failing instance stays in rotation.
pub struct RetryingDispatcher<Req, Resp> {
    balancer: LoadBalancer<Req, Resp>,
    config: RetryConfig,
    callback: Option<RetryCallback>,
}

impl<Req, Resp> RetryingDispatcher<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    pub fn new(balancer: LoadBalancer<Req, Resp>, config: RetryConfig) -> Self {
        Self {
            balancer,
            config,
            callback: None,
        }
    }

    /// Consult `callback` after every failed attempt
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, &ProxyError) -> RetryDecision + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn balancer(&self) -> &LoadBalancer<Req, Resp> {
        &self.balancer
    }

    /// Invoke with a fresh retry budget
    pub async fn invoke(&self, request: Req) -> Result<Resp> {
        self.invoke_until(request, None).await
    }

    /// Invoke with a fresh retry budget, also bounded by `outer`
    pub async fn invoke_until(&self, request: Req, outer: Option<Instant>) -> Result<Resp> {
        let start = Instant::now();
        let budget_deadline = start + self.config.max_elapsed();
        let deadline = match outer {
            Some(outer) => budget_deadline.min(outer),
            None => budget_deadline,
        };

        let mut backoff = self.config.create_backoff();
        let mut attempts: u32 = 0;
        let mut last_error: Option<ProxyError> = None;

        loop {
            if attempts >= self.config.max_attempts {
                let last_error = last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no attempts made".to_string());
                warn!(
                    attempts,
                    max_attempts = self.config.max_attempts,
                    error = %last_error,
                    "Request failed after max attempts"
                );
                return Err(ProxyError::MaxAttemptsExceeded {
                    attempts,
                    last_error,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.time_budget_exceeded(start, last_error.map(|e| e.to_string())));
            }

            let member = self.balancer.next()?;
            attempts += 1;
            debug!(
                attempt = attempts,
                max_attempts = self.config.max_attempts,
                instance = %member.name(),
                "Executing request"
            );

            let call = member.endpoint().call(request.clone(), Some(deadline));
            let error = match tokio::time::timeout(deadline - now, call).await {
                Ok(Ok(response)) => {
                    if attempts > 1 {
                        debug!(attempt = attempts, "Request succeeded after retries");
                    }
                    return Ok(response);
                }
                Ok(Err(e)) => e,
                Err(_) => {
                    // The in-flight call is dropped here and its result discarded
                    let abandoned = format!(
                        "attempt {} to {} abandoned at deadline",
                        attempts,
                        member.name()
                    );
                    return Err(self.time_budget_exceeded(start, Some(abandoned)));
                }
            };

            debug!(
                attempt = attempts,
                instance = %member.name(),
                error = %error,
                "Attempt failed"
            );

            let error = match &self.callback {
                Some(callback) => {
                    let decision = callback(attempts, &error);
                    let error = decision.replacement.unwrap_or(error);
                    if !decision.keep_trying {
                        debug!(attempt = attempts, error = %error, "Retry callback stopped retries");
                        return Err(error);
                    }
                    error
                }
                None => error,
            };
            last_error = Some(error);

            if attempts >= self.config.max_attempts {
                continue;
            }
            if let Some(wait) = backoff.as_mut().and_then(|b| b.next_backoff()) {
                let wait = wait.min(deadline.saturating_duration_since(Instant::now()));
                debug!(wait_ms = wait.as_millis() as u64, "Backing off before next attempt");
                tokio::time::sleep(wait).await;
            }
        }
    }

    fn time_budget_exceeded(&self, start: Instant, last_error: Option<String>) -> ProxyError {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        warn!(
            elapsed_ms,
            max_elapsed_ms = self.config.max_elapsed_ms,
            error = last_error.as_deref().unwrap_or(""),
            "Request failed after time budget"
        );
        ProxyError::TimeBudgetExceeded {
            elapsed_ms,
            last_error,
        }
    }
}

#[async_trait]
impl<Req, Resp> Endpoint<Req, Resp> for RetryingDispatcher<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req, deadline: Option<Instant>) -> Result<Resp> {
        self.invoke_until(request, deadline).await
    }
}
