//! Liveness, readiness and deep health probes for axum services.
//!
//! Checks are registered on a [`HealthService`]; [`create_app`] wraps an
//! existing router so the configured probe paths are answered before routing
//! and every other request reaches the application unchanged.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;

pub use cache::{CacheStats, CacheStrategy, ResponseCache};
pub use config::{AppConfig, CacheConfig, HealthConfig, ServerConfig};
pub use error::{AppError, Result};
pub use health::{
    CheckResult, Component, Endpoint, FnCheck, HealthCheck, HealthReport, HealthService,
    HealthServiceBuilder, HealthStatus,
};
pub use middleware::authorization::Authorization;
pub use middleware::health::health_check_middleware;

use axum::{middleware as axum_middleware, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

pub fn create_app(service: HealthService, app: Router) -> Router {
    create_app_with_service(Arc::new(service), app)
}

pub fn create_app_with_service(service: Arc<HealthService>, app: Router) -> Router {
    let app = app.layer(axum_middleware::from_fn_with_state(
        service,
        middleware::health::health_check_middleware,
    ));

    middleware::logging::with_request_logging(app)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
