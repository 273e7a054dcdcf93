pub mod breaker;
pub mod endpoint;
pub mod types;

pub use breaker::{CircuitBreaker, Permit};
pub use endpoint::CircuitBreakerEndpoint;
pub use types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
