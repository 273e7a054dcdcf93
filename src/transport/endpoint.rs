use super::Transport;
use crate::endpoint::Endpoint;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::time::Instant;

pub type EncodeFn<Req> = fn(&Req) -> Result<Bytes>;
pub type DecodeFn<Resp> = fn(&[u8]) -> Result<Resp>;

/// Endpoint that encodes a request, sends it over a transport and decodes
/// the reply
pub struct TransportEndpoint<Req, Resp> {
    transport: Arc<dyn Transport>,
    encode: EncodeFn<Req>,
    decode: DecodeFn<Resp>,
}

impl<Req, Resp> TransportEndpoint<Req, Resp> {
    pub fn new(transport: Arc<dyn Transport>, encode: EncodeFn<Req>, decode: DecodeFn<Resp>) -> Self {
        Self {
            transport,
            encode,
            decode,
        }
    }
}

#[async_trait]
impl<Req, Resp> Endpoint<Req, Resp> for TransportEndpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, request: Req, deadline: Option<Instant>) -> Result<Resp> {
        let body = (self.encode)(&request)?;
        let reply = self.transport.send(body, deadline).await?;
        (self.decode)(&reply)
    }
}
