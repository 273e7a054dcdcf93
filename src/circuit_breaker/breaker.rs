use super::types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker for a single instance
///
/// State lives behind a short-lived mutex: callers check in with
/// [`try_acquire`](Self::try_acquire) before the upstream call and report
/// the outcome afterwards with the returned [`Permit`]. The lock is never
/// held while the call runs.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Configuration
    config: CircuitBreakerConfig,
    /// Current state
    state: Mutex<State>,
    /// Instance identifier
    instance: String,
}

/// Admission granted by [`CircuitBreaker::try_acquire`]
///
/// Outcomes only drive state transitions when reported in the same
/// generation the permit was issued in. In half-open state only the trial
/// permit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit {
    generation: u64,
    trial: bool,
}

impl Permit {
    /// Whether this permit admitted the half-open trial call
    pub fn is_trial(&self) -> bool {
        self.trial
    }
}

#[derive(Debug)]
struct State {
    /// Current circuit state
    circuit_state: CircuitState,
    /// Bumped on every transition
    generation: u64,
    /// Number of consecutive failures in closed state
    consecutive_failures: u32,
    /// Number of opens since the circuit was last closed
    consecutive_opens: u32,
    /// Whether the half-open trial request is in flight
    trial_in_flight: bool,
    /// When the open circuit may attempt a trial
    open_until: Option<Instant>,
    /// Metrics
    metrics: CircuitBreakerMetrics,
}

impl State {
    fn permit(&self, trial: bool) -> Permit {
        Permit {
            generation: self.generation,
            trial,
        }
    }

    /// Whether an outcome reported with `permit` may change the state
    fn is_current(&self, permit: Permit) -> bool {
        if permit.generation != self.generation {
            return false;
        }
        match self.circuit_state {
            CircuitState::Closed => !permit.trial,
            CircuitState::HalfOpen => permit.trial,
            CircuitState::Open => false,
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(instance: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let instance = instance.into();
        info!(
            instance = %instance,
            failure_threshold = config.failure_threshold,
            timeout_ms = config.timeout_ms,
            max_timeout_ms = config.max_timeout_ms,
            "Creating circuit breaker"
        );

        Self {
            config,
            state: Mutex::new(State {
                circuit_state: CircuitState::Closed,
                generation: 0,
                consecutive_failures: 0,
                consecutive_opens: 0,
                trial_in_flight: false,
                open_until: None,
                metrics: CircuitBreakerMetrics::default(),
            }),
            instance,
        }
    }

    /// Instance this breaker guards
    pub fn instance(&self) -> &str {
        &self.instance
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if a request can proceed, returning the permit to report its
    /// outcome with
    pub fn try_acquire(&self) -> Option<Permit> {
        let mut state = self.lock();

        match state.circuit_state {
            CircuitState::Closed => {
                state.metrics.total_requests += 1;
                Some(state.permit(false))
            }
            CircuitState::Open => {
                let now = Instant::now();
                match state.open_until {
                    Some(open_until) if now >= open_until => {
                        self.transition_to_half_open(&mut state);
                        state.trial_in_flight = true;
                        state.metrics.total_requests += 1;
                        Some(state.permit(true))
                    }
                    Some(open_until) => {
                        state.metrics.rejected_requests += 1;
                        debug!(
                            instance = %self.instance,
                            time_remaining = ?open_until.saturating_duration_since(now),
                            "Circuit breaker open, rejecting request"
                        );
                        None
                    }
                    None => {
                        // Should not happen, but handle gracefully
                        warn!(instance = %self.instance, "Circuit open but no cooldown deadline");
                        state.metrics.rejected_requests += 1;
                        None
                    }
                }
            }
            CircuitState::HalfOpen => {
                if state.trial_in_flight {
                    state.metrics.rejected_requests += 1;
                    debug!(
                        instance = %self.instance,
                        "Half-open trial in flight, rejecting"
                    );
                    None
                } else {
                    state.trial_in_flight = true;
                    state.metrics.total_requests += 1;
                    debug!(instance = %self.instance, "Allowing half-open trial request");
                    Some(state.permit(true))
                }
            }
        }
    }

    /// Record a successful request
    pub fn record_success(&self, permit: Permit) {
        let mut state = self.lock();
        state.metrics.successful_requests += 1;

        if !state.is_current(permit) {
            debug!(
                instance = %self.instance,
                state = %state.circuit_state,
                "Ignoring success admitted before the last transition"
            );
            return;
        }

        match state.circuit_state {
            CircuitState::Closed => {
                state.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                debug!(instance = %self.instance, "Half-open trial request succeeded");
                self.transition_to_closed(&mut state);
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, permit: Permit) {
        let mut state = self.lock();
        self.fail(&mut state, permit);
    }

    /// Record a request that was dropped before reporting an outcome.
    /// Counts as a failure.
    pub fn record_abandoned(&self, permit: Permit) {
        let mut state = self.lock();
        state.metrics.abandoned_requests += 1;
        self.fail(&mut state, permit);
    }

    fn fail(&self, state: &mut State, permit: Permit) {
        state.metrics.failed_requests += 1;

        if !state.is_current(permit) {
            debug!(
                instance = %self.instance,
                state = %state.circuit_state,
                "Ignoring failure admitted before the last transition"
            );
            return;
        }

        match state.circuit_state {
            CircuitState::Closed => {
                state.consecutive_failures += 1;

                debug!(
                    instance = %self.instance,
                    consecutive_failures = state.consecutive_failures,
                    threshold = self.config.failure_threshold,
                    "Request failed in closed state"
                );

                if state.consecutive_failures >= self.config.failure_threshold {
                    self.transition_to_open(state);
                }
            }
            CircuitState::HalfOpen => {
                warn!(
                    instance = %self.instance,
                    "Half-open trial request failed, reopening circuit"
                );
                self.transition_to_open(state);
            }
            CircuitState::Open => {}
        }
    }

    /// Get current state
    pub fn state(&self) -> CircuitState {
        self.lock().circuit_state
    }

    /// Consecutive failures counted in closed state
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Time left until the open circuit allows a trial, if open
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        let state = self.lock();
        match state.circuit_state {
            CircuitState::Open => state
                .open_until
                .map(|until| until.saturating_duration_since(Instant::now())),
            _ => None,
        }
    }

    /// Get metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.lock().metrics.clone()
    }

    /// Transition to open state
    fn transition_to_open(&self, state: &mut State) {
        state.consecutive_opens = state.consecutive_opens.saturating_add(1);
        let cooldown = self.config.cooldown_for(state.consecutive_opens);

        info!(
            instance = %self.instance,
            consecutive_failures = state.consecutive_failures,
            consecutive_opens = state.consecutive_opens,
            cooldown = ?cooldown,
            "Circuit breaker opening"
        );

        state.circuit_state = CircuitState::Open;
        state.generation += 1;
        state.open_until = Some(Instant::now() + cooldown);
        state.consecutive_failures = 0;
        state.trial_in_flight = false;
        state.metrics.circuit_opened_count += 1;
    }

    /// Transition to half-open state
    fn transition_to_half_open(&self, state: &mut State) {
        info!(
            instance = %self.instance,
            consecutive_opens = state.consecutive_opens,
            "Circuit breaker transitioning to half-open"
        );

        state.circuit_state = CircuitState::HalfOpen;
        state.generation += 1;
        state.open_until = None;
        state.trial_in_flight = false;
        state.metrics.circuit_half_opened_count += 1;
    }

    /// Transition to closed state
    fn transition_to_closed(&self, state: &mut State) {
        info!(instance = %self.instance, "Circuit breaker closing");

        state.circuit_state = CircuitState::Closed;
        state.generation += 1;
        state.open_until = None;
        state.consecutive_failures = 0;
        state.consecutive_opens = 0;
        state.trial_in_flight = false;
        state.metrics.circuit_closed_count += 1;
    }
}
