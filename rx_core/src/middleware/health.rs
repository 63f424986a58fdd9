use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::handlers::health::{handle_deep, handle_liveness, handle_readiness};
use crate::health::{Endpoint, HealthService};

/// Answers the configured probe paths and passes every other request through.
pub async fn health_check_middleware(
    State(service): State<Arc<HealthService>>,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = match service.endpoint_for(request.uri().path()) {
        Some(endpoint) => endpoint,
        None => return next.run(request).await,
    };

    debug!("Health check request for {:?}", endpoint);

    match endpoint {
        Endpoint::Liveness => handle_liveness(&service).await,
        Endpoint::Readiness => handle_readiness(&service).await,
        Endpoint::Deep => {
            let authorized = service.authorization().is_authorized(&request);
            handle_deep(&service, authorized).await
        }
    }
}
