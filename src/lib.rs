pub mod circuit_breaker;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod instance;
pub mod loadbalancer;
pub mod rate_limit;
pub mod retry;
pub mod service;
pub mod transport;

use crate::config::StringSvcConfig;
use crate::error::{ProxyError, Result};
use crate::service::{BasicStringService, LoggingMiddleware, ProxyingMiddleware, StringService};
use crate::transport::server::{create_router, AppState};
use std::sync::Arc;
use tracing::info;

/// Assemble the service stack: business logic, then logging, then proxying
pub fn build_service(config: &StringSvcConfig) -> Result<AppState> {
    let basic: Arc<dyn StringService> = Arc::new(BasicStringService);
    let logged: Arc<dyn StringService> = Arc::new(LoggingMiddleware::new(basic));

    let proxy = ProxyingMiddleware::http(&config.proxy.instances, &config.proxy)?;
    let service = proxy.wrap(logged);

    Ok(AppState {
        service,
        proxy: Arc::new(proxy),
    })
}

/// Initialize the string service server
pub async fn run(config: StringSvcConfig) -> Result<()> {
    // Validate configuration
    config.validate()?;

    info!("Starting string service");

    let state = build_service(&config)?;
    let app = create_router(state);

    // Bind and serve
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(listen = %addr, "Server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| ProxyError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stringsvc=debug,tower_http=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();
}
