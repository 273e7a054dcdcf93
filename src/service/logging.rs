use super::StringService;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Logs every call with its input, output and latency
pub struct LoggingMiddleware {
    next: Arc<dyn StringService>,
}

impl LoggingMiddleware {
    pub fn new(next: Arc<dyn StringService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl StringService for LoggingMiddleware {
    async fn uppercase(&self, s: String) -> Result<String> {
        let start = Instant::now();
        let input = s.clone();
        let result = self.next.uppercase(s).await;

        match &result {
            Ok(output) => info!(
                method = "uppercase",
                input = %input,
                output = %output,
                took_us = start.elapsed().as_micros() as u64,
                "Call completed"
            ),
            Err(e) => info!(
                method = "uppercase",
                input = %input,
                error = %e,
                took_us = start.elapsed().as_micros() as u64,
                "Call failed"
            ),
        }

        result
    }

    fn count(&self, s: &str) -> usize {
        let start = Instant::now();
        let n = self.next.count(s);
        info!(
            method = "count",
            input = %s,
            output = n,
            took_us = start.elapsed().as_micros() as u64,
            "Call completed"
        );
        n
    }
}
