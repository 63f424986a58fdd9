use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use rx_core::{
    create_app, Authorization, CacheConfig, CacheStrategy, FnCheck, HealthConfig, HealthService,
    HealthServiceBuilder,
};
use serde_json::Value;
use tower::ServiceExt;

fn passing(name: &str) -> FnCheck {
    FnCheck::new(name, || async { Ok(true) })
}

fn failing(name: &str) -> FnCheck {
    FnCheck::new(name, || async { Err(anyhow::anyhow!("err")) })
}

fn counting(name: &str, calls: Arc<AtomicUsize>) -> FnCheck {
    FnCheck::new(name, move || {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    })
}

fn application() -> Router {
    Router::new().route("/", get(|| async { "response" }))
}

fn app(builder: HealthServiceBuilder) -> Router {
    create_app(builder.build().unwrap(), application())
}

async fn call(app: &Router, uri: &str) -> Response {
    call_with_header(app, uri, None).await
}

async fn call_with_header(app: &Router, uri: &str, authorization: Option<&str>) -> Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    let request = builder.body(Body::empty()).unwrap();

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_liveness_ok() {
    let app = app(HealthService::builder().liveness(passing("fs")));

    let response = call(&app, "/liveness").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["integrations"][0]["fs"]["alive"], true);
    assert_eq!(body["integrations"][0]["fs"]["required"], true);
    assert!(body["integrations"][0]["fs"]["duration"].is_number());
}

#[tokio::test]
async fn test_liveness_fails_if_check_fails() {
    let app = app(HealthService::builder().liveness(failing("fs")));

    let response = call(&app, "/liveness").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["integrations"][0]["fs"]["alive"], false);
    assert_eq!(body["integrations"][0]["fs"]["message"], "err");
}

#[tokio::test]
async fn test_readiness_fails_if_any_one_check_fails() {
    let app = app(
        HealthService::builder()
            .readiness(passing("1"))
            .readiness(failing("2")),
    );

    let response = call(&app, "/readiness").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["integrations"].as_array().unwrap().len(), 2);
    assert!(body["integrations"][0].get("1").is_some());
    assert!(body["integrations"][1].get("2").is_some());
}

#[tokio::test]
async fn test_empty_check_sets_are_ok() {
    let app = app(HealthService::builder());

    for path in ["/liveness", "/readiness", "/deep"] {
        let response = call(&app, path).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["integrations"], serde_json::json!([]));
    }
}

#[tokio::test]
async fn test_deep_fails_if_any_critical_fails() {
    let app = app(
        HealthService::builder()
            .deep_critical(failing("fail"))
            .deep_secondary(passing("secondary")),
    );

    let response = call(&app, "/deep").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["status"], "error");
}

#[tokio::test]
async fn test_deep_is_degraded_when_secondary_fails() {
    let app = app(
        HealthService::builder()
            .deep_critical(passing("db"))
            .deep_secondary(failing("x")),
    );

    let response = call(&app, "/deep").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["integrations"][0]["db"]["required"], true);
    assert_eq!(body["integrations"][1]["x"]["alive"], false);
    assert_eq!(body["integrations"][1]["x"]["required"], false);
}

#[tokio::test]
async fn test_deep_token_authorization() {
    let health = HealthConfig {
        authorization_token: Some("123".to_string()),
        ..HealthConfig::default()
    };
    let app = app(HealthService::builder().health_config(health));

    let rejected = call_with_header(&app, "/deep", Some("12")).await;
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(rejected).await,
        serde_json::json!({"message": "authorization failed"})
    );

    let missing = call(&app, "/deep").await;
    assert_eq!(missing.status(), StatusCode::FORBIDDEN);

    let accepted = call_with_header(&app, "/deep", Some("123")).await;
    assert_eq!(accepted.status(), StatusCode::OK);

    // Only the deep endpoint is guarded.
    assert_eq!(call(&app, "/liveness").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authorization_failure_runs_no_checks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        HealthService::builder()
            .deep_critical(counting("db", Arc::clone(&calls)))
            .authorization(Authorization::custom(|_| false)),
    );

    let response = call(&app, "/deep").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_health_requests_pass_through() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(HealthService::builder().liveness(counting("fs", Arc::clone(&calls))));

    let response = call(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"response");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(call(&app, "/missing").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_paths_are_configurable() {
    let health = HealthConfig {
        liveness_path: "/custom-live".to_string(),
        readiness_path: "/custom-ready".to_string(),
        deep_path: "/custom-deep".to_string(),
        authorization_token: None,
    };
    let app = app(HealthService::builder().health_config(health));

    for path in ["/custom-live", "/custom-ready", "/custom-deep"] {
        let response = call(&app, path).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        assert!(json_body(response).await.get("status").is_some());
    }

    assert_eq!(call(&app, "/liveness").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deep_response_is_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        HealthService::builder()
            .deep_critical(counting("db", Arc::clone(&calls)))
            .deep_secondary(failing("x")),
    );

    let first = json_body(call(&app, "/deep").await).await;
    let second = json_body(call(&app, "/deep").await).await;

    assert_eq!(first, second);
    assert_eq!(second["status"], "degraded");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_cache_recomputes_deep() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        HealthService::builder()
            .deep_critical(counting("db", Arc::clone(&calls)))
            .cache_config(CacheConfig::disabled()),
    );

    call(&app, "/deep").await;
    call(&app, "/deep").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_liveness_and_readiness_are_never_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(
        HealthService::builder()
            .liveness(counting("fs", Arc::clone(&calls)))
            .cache_config(CacheConfig {
                strategy: CacheStrategy::Map,
                ttl_seconds: 60,
                max_size: 1,
            }),
    );

    call(&app, "/liveness").await;
    call(&app, "/liveness").await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
