use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for string service and proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors produced by the string service and the proxying path
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("circuit breaker is open for instance: {0}")]
    CircuitOpen(String),

    #[error("rate limit exceeded for instance: {0}")]
    RateExceeded(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("retry attempts exceeded after {attempts} attempts: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: String },

    #[error("retry time budget exceeded after {elapsed_ms}ms{}", fmt_last_error(.last_error))]
    TimeBudgetExceeded {
        elapsed_ms: u64,
        last_error: Option<String>,
    },

    #[error("no endpoints available")]
    NoEndpoints,

    #[error("empty string")]
    EmptyString,

    #[error("{0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid instance address: {0}")]
    InvalidInstance(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn fmt_last_error(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(": {}", e),
        None => String::new(),
    }
}

impl ProxyError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::RateExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::MaxAttemptsExceeded { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::TimeBudgetExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::NoEndpoints => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::EmptyString => StatusCode::BAD_REQUEST,
            ProxyError::Remote(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::InvalidInstance(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Serialization(_) => StatusCode::BAD_REQUEST,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the retry loop gave up because its attempt or time budget ran out
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(
            self,
            ProxyError::MaxAttemptsExceeded { .. } | ProxyError::TimeBudgetExceeded { .. }
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
