//! The string service and its decorators
//!
//! [`BasicStringService`] holds the business logic. [`LoggingMiddleware`]
//! and [`ProxyingMiddleware`] wrap any [`StringService`] and expose the same
//! interface, so callers cannot tell a proxied call from a local one.

pub mod basic;
pub mod logging;
pub mod proxying;

use crate::error::Result;
use async_trait::async_trait;

pub use basic::BasicStringService;
pub use logging::LoggingMiddleware;
pub use proxying::{ProxyingMiddleware, ProxyingService, UppercaseEndpoint};

/// Operations provided by the string service
#[async_trait]
pub trait StringService: Send + Sync {
    /// Uppercase `s`; empty input is an error
    async fn uppercase(&self, s: String) -> Result<String>;

    /// Length of `s` in bytes
    fn count(&self, s: &str) -> usize;
}
