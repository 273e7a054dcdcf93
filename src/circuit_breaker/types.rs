use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, allowing a single trial request
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "Closed"),
            CircuitState::Open => write!(f, "Open"),
            CircuitState::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Cooldown in open state before the first half-open trial
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound for the cooldown after repeated reopens
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,

    /// Cooldown growth factor per consecutive open
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_max_timeout_ms() -> u64 {
    600_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            timeout_ms: default_timeout_ms(),
            max_timeout_ms: default_max_timeout_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_timeout(&self) -> Duration {
        Duration::from_millis(self.max_timeout_ms.max(self.timeout_ms))
    }

    /// Cooldown for the n-th consecutive open (1-based):
    /// `timeout * multiplier^(n-1)`, capped at `max_timeout`.
    pub fn cooldown_for(&self, consecutive_opens: u32) -> Duration {
        if self.timeout_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = consecutive_opens.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.timeout_ms as f64 * self.backoff_multiplier.max(1.0).powi(exponent);
        let capped = scaled.min(self.max_timeout().as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Circuit breaker metrics
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerMetrics {
    /// Total number of requests let through
    pub total_requests: u64,
    /// Number of successful requests
    pub successful_requests: u64,
    /// Number of failed requests
    pub failed_requests: u64,
    /// Number of requests rejected (circuit open)
    pub rejected_requests: u64,
    /// Number of requests dropped before they reported an outcome
    pub abandoned_requests: u64,
    /// Number of times circuit opened
    pub circuit_opened_count: u64,
    /// Number of times circuit closed
    pub circuit_closed_count: u64,
    /// Number of times circuit half-opened
    pub circuit_half_opened_count: u64,
}
