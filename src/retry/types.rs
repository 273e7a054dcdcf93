use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry budget for one proxied call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock budget in milliseconds
    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,

    /// Initial pause between attempts in milliseconds (0 disables backoff)
    #[serde(default)]
    pub backoff_initial_ms: u64,

    /// Maximum pause between attempts in milliseconds
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_max_elapsed_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    50
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_elapsed_ms: default_max_elapsed_ms(),
            backoff_initial_ms: 0,
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, max_elapsed: Duration) -> Self {
        Self {
            max_attempts,
            max_elapsed_ms: max_elapsed.as_millis() as u64,
            ..Default::default()
        }
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    /// Backoff between attempts, if enabled
    pub fn create_backoff(&self) -> Option<ExponentialBackoff> {
        if self.backoff_initial_ms == 0 {
            return None;
        }

        Some(
            ExponentialBackoffBuilder::new()
                .with_initial_interval(Duration::from_millis(self.backoff_initial_ms))
                .with_max_interval(Duration::from_millis(
                    self.backoff_max_ms.max(self.backoff_initial_ms),
                ))
                .with_multiplier(2.0)
                .with_randomization_factor(0.0)
                .with_max_elapsed_time(None) // The dispatcher enforces its own budget
                .build(),
        )
    }
}
