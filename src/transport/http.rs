use super::Transport;
use crate::error::{ProxyError, Result};
use crate::instance::Instance;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// JSON-over-HTTP transport to a single instance
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    request_timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport posting to the instance's locator
    pub fn new(client: reqwest::Client, instance: &Instance, request_timeout: Duration) -> Self {
        Self {
            client,
            url: instance.url().clone(),
            request_timeout,
        }
    }

    /// Build a client suitable for sharing across instance transports
    pub fn client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to create HTTP client: {}", e)))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    // The tighter of the configured request timeout and the caller's deadline
    fn timeout_for(&self, deadline: Option<Instant>) -> Option<Duration> {
        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    None
                } else {
                    Some(remaining.min(self.request_timeout))
                }
            }
            None => Some(self.request_timeout),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: Bytes, deadline: Option<Instant>) -> Result<Bytes> {
        let timeout = self.timeout_for(deadline).ok_or_else(|| {
            ProxyError::Upstream(format!("Deadline passed before request to {}", self.url))
        })?;

        debug!(url = %self.url, timeout_ms = timeout.as_millis() as u64, "Sending request");

        let response = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProxyError::Upstream(format!("Request to {} timed out: {}", self.url, e))
                } else if e.is_connect() {
                    ProxyError::Upstream(format!("Failed to connect to {}: {}", self.url, e))
                } else {
                    ProxyError::Upstream(format!("Request to {} failed: {}", self.url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream(format!(
                "{} responded with status {}",
                self.url, status
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ProxyError::Upstream(format!("Failed to read response from {}: {}", self.url, e)))
    }
}
