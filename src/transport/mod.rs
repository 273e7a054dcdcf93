//! Wire plumbing for the string service
//!
//! The proxy core only needs three capabilities per instance: encode a
//! request, send it with a deadline and decode the reply. [`Transport`] is
//! the send half; [`TransportEndpoint`] joins it with a codec into an
//! [`Endpoint`](crate::endpoint::Endpoint).

pub mod codec;
pub mod endpoint;
pub mod http;
pub mod server;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

pub use codec::{CountRequest, CountResponse, UppercaseRequest, UppercaseResponse};
pub use endpoint::TransportEndpoint;
pub use http::HttpTransport;
pub use server::create_router;

/// Name of the proxied operation, also its default path segment
pub const UPPERCASE_OPERATION: &str = "uppercase";

/// Sends an encoded request to one instance and returns the encoded reply
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: Bytes, deadline: Option<Instant>) -> Result<Bytes>;
}
