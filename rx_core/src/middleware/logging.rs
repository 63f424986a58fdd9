//! Request logging middleware configuration

use axum::{body::Body, Router};
use http::{Request, Response};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

/// Wraps `router` in a trace layer that opens one span per request and logs
/// each response by status class.
pub fn with_request_logging(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            })
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                let status = response.status().as_u16();
                let latency_ms = latency.as_millis();

                if response.status().is_success() {
                    tracing::debug!(status, latency_ms, "request completed");
                } else if response.status().is_client_error() {
                    tracing::warn!(status, latency_ms, "client error response");
                } else {
                    tracing::error!(status, latency_ms, "server error response");
                }
            })
            .on_failure(
                |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    tracing::error!(
                        latency_ms = latency.as_millis(),
                        error = ?error,
                        "request failed"
                    );
                },
            ),
    )
}
