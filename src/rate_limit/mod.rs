//! Rate limiting module
//!
//! Each proxied instance gets its own in-memory token bucket, backed by
//! `governor`. A call that finds the bucket empty fails immediately with
//! [`ProxyError::RateExceeded`](crate::error::ProxyError::RateExceeded);
//! there is no queueing.
//!
//! # Example
//!
//! ```rust
//! use stringsvc::rate_limit::{RateLimitConfig, TokenBucket};
//!
//! let bucket = TokenBucket::new(RateLimitConfig::per_second(100)).unwrap();
//! assert!(bucket.try_acquire());
//! ```

pub mod endpoint;
pub mod limiter;
pub mod types;

pub use endpoint::RateLimitedEndpoint;
pub use limiter::TokenBucket;
pub use types::RateLimitConfig;
