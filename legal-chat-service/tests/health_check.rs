mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use legal_chat_service::startup::{build_router, AppState};
use legal_chat_service::services::InMemoryStore;
use std::sync::Arc;
use tower::ServiceExt;

#[tokio::test]
async fn health_check_reports_complete_configuration() {
    let app = common::TestApp::spawn().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "legal-chat-service");
    assert_eq!(body["environment"], "ok");
    assert!(body["missing_vars"].as_array().unwrap().is_empty());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_check_lists_missing_settings() {
    let mut config = common::test_config("http://127.0.0.1:9", "http://127.0.0.1:9");
    config.openai.api_key = None;
    let router = build_router(AppState::new(config, Arc::new(InMemoryStore::new())));

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["environment"], "missing_vars");
    assert_eq!(body["missing_vars"], serde_json::json!(["OPENAI_API_KEY"]));
}

#[tokio::test]
async fn readiness_and_metrics_are_public() {
    let config = common::test_config("http://127.0.0.1:9", "http://127.0.0.1:9");
    let router = build_router(AppState::new(config, Arc::new(InMemoryStore::new())));

    let ready = router
        .clone()
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let metrics = router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let app = common::TestApp::spawn().await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, app.url("/chat"))
        .header("origin", "https://app.example.nl")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization, content-type")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
