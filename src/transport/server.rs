use super::codec::{CountRequest, CountResponse, UppercaseRequest, UppercaseResponse};
use crate::error::{ProxyError, Result};
use crate::service::{ProxyingMiddleware, StringService};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn StringService>,
    pub proxy: Arc<ProxyingMiddleware>,
}

/// HTTP routes for the string service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/uppercase", post(uppercase_handler))
        .route("/count", post(count_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Unreadable request bodies become a `ProxyError` response
fn request_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| ProxyError::Serialization(rejection.body_text()))
}

/// Service errors are reported in the `err` field with a 200 status, so a
/// proxying peer can tell them apart from transport failures.
async fn uppercase_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UppercaseRequest>, JsonRejection>,
) -> Result<Json<UppercaseResponse>> {
    let request = request_body(payload)?;
    Ok(match state.service.uppercase(request.s).await {
        Ok(v) => Json(UppercaseResponse::ok(v)),
        Err(e) => Json(UppercaseResponse::error(e.to_string())),
    })
}

async fn count_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CountRequest>, JsonRejection>,
) -> Result<Json<CountResponse>> {
    let request = request_body(payload)?;
    Ok(Json(CountResponse {
        v: state.service.count(&request.s),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let instances: Vec<Value> = state
        .proxy
        .breaker_states()
        .into_iter()
        .map(|(instance, circuit)| json!({ "instance": instance, "circuit": circuit.to_string() }))
        .collect();

    Json(json!({
        "status": "ok",
        "proxying": state.proxy.is_enabled(),
        "instances": instances,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::service::BasicStringService;
    use assert_json_diff::assert_json_eq;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn local_app() -> Router {
        create_router(AppState {
            service: Arc::new(BasicStringService),
            proxy: Arc::new(ProxyingMiddleware::Disabled),
        })
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_uppercase_route() {
        let (status, body) = post_json(local_app(), "/uppercase", r#"{"s":"hello"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_eq!(body, json!({ "v": "HELLO" }));
    }

    #[tokio::test]
    async fn test_uppercase_error_in_body() {
        let (status, body) = post_json(local_app(), "/uppercase", r#"{"s":""}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_eq!(body, json!({ "v": "", "err": "empty string" }));
    }

    #[tokio::test]
    async fn test_count_route() {
        let (status, body) = post_json(local_app(), "/count", r#"{"s":"hello"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_eq!(body, json!({ "v": 5 }));
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let (status, body) = post_json(local_app(), "/uppercase", r#"{"s":"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], json!(400));
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Serialization error:"));

        let (status, _) = post_json(local_app(), "/count", r#"{"text":"hello"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_route() {
        let proxy = ProxyingMiddleware::new("a:1", &ProxyConfig::default(), |_| {
            Ok(Arc::new(crate::endpoint::endpoint_fn(|req: UppercaseRequest| async move {
                Ok::<_, crate::error::ProxyError>(UppercaseResponse::ok(req.s))
            })) as crate::service::UppercaseEndpoint)
        })
        .unwrap();
        let app = create_router(AppState {
            service: Arc::new(BasicStringService),
            proxy: Arc::new(proxy),
        });

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_json_eq!(
            body,
            json!({
                "status": "ok",
                "proxying": true,
                "instances": [{ "instance": "a:1", "circuit": "Closed" }],
            })
        );
    }
}
