//! Rendering of health reports into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::error::AppError;
use crate::health::{HealthReport, HealthService, HealthStatus};

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status_code = if self.status.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status_code, Json(self)).into_response()
    }
}

pub async fn handle_liveness(service: &HealthService) -> Response {
    info!("Liveness probe");
    let report = service.liveness().await;
    log_status("liveness", report.status);
    report.into_response()
}

pub async fn handle_readiness(service: &HealthService) -> Response {
    info!("Readiness probe");
    let report = service.readiness().await;
    log_status("readiness", report.status);
    report.into_response()
}

/// Authorization is checked before any deep check runs.
pub async fn handle_deep(service: &HealthService, authorized: bool) -> Response {
    info!("Deep health probe");

    if !authorized {
        warn!("Deep health probe rejected: authorization failed");
        return AppError::Authorization("deep health check".to_string()).into_response();
    }

    let report = service.deep().await;
    log_status("deep", report.status);
    report.into_response()
}

fn log_status(endpoint: &str, status: HealthStatus) {
    match status {
        HealthStatus::Ok => info!("{} status: {}", endpoint, status),
        HealthStatus::Degraded => warn!("{} status is degraded", endpoint),
        HealthStatus::Error => warn!("{} status is error", endpoint),
    }
}
