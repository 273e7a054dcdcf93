use crate::error::{ProxyError, Result};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Request body for the uppercase operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UppercaseRequest {
    pub s: String,
}

/// Response body for the uppercase operation. `err` is empty on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UppercaseResponse {
    pub v: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,
}

impl UppercaseResponse {
    pub fn ok(v: impl Into<String>) -> Self {
        Self {
            v: v.into(),
            err: String::new(),
        }
    }

    pub fn error(err: impl Into<String>) -> Self {
        Self {
            v: String::new(),
            err: err.into(),
        }
    }
}

/// Request body for the count operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRequest {
    pub s: String,
}

/// Response body for the count operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub v: usize,
}

/// Encode a request as a JSON body
pub fn encode_json_request<T: Serialize>(request: &T) -> Result<Bytes> {
    serde_json::to_vec(request)
        .map(Bytes::from)
        .map_err(|e| ProxyError::Serialization(format!("Failed to encode request: {}", e)))
}

/// Decode a JSON response body. Undecodable bodies are upstream failures.
pub fn decode_json_response<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| ProxyError::Upstream(format!("Failed to decode response: {}", e)))
}
