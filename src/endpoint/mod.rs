//! Callable units
//!
//! An [`Endpoint`] is the smallest invocable abstraction: one async function
//! from a request to a response, bound to a single remote instance and a
//! single operation. Circuit breakers, rate limiters and the retrying
//! dispatcher are all endpoints themselves, so they compose by wrapping.

use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::Instant;

/// A single async call from `Req` to `Resp`
#[async_trait]
pub trait Endpoint<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Invoke the endpoint. `deadline` is advisory: implementations that
    /// perform I/O should not wait past it.
    async fn call(&self, request: Req, deadline: Option<Instant>) -> Result<Resp>;
}

/// Shared, type-erased endpoint
pub type BoxEndpoint<Req, Resp> = Arc<dyn Endpoint<Req, Resp>>;

/// Endpoint backed by an async closure
pub struct FnEndpoint<F, Req> {
    f: F,
    _request: PhantomData<fn(Req)>,
}

/// Build an endpoint from an async closure. The deadline is not passed to
/// the closure.
pub fn endpoint_fn<F, Req>(f: F) -> FnEndpoint<F, Req> {
    FnEndpoint {
        f,
        _request: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, Req, Resp> Endpoint<Req, Resp> for FnEndpoint<F, Req>
where
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp>> + Send,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req, _deadline: Option<Instant>) -> Result<Resp> {
        (self.f)(request).await
    }
}
