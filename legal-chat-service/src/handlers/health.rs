use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{services::metrics::get_metrics, startup::AppState};

pub const SERVICE_NAME: &str = "legal-chat-service";

/// Liveness plus configuration completeness and a storage ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let missing_vars = state.config.missing_settings();
    let environment = if missing_vars.is_empty() {
        "ok"
    } else {
        "missing_vars"
    };

    let storage = state.store.health_check().await;
    let healthy = missing_vars.is_empty() && storage.is_ok();

    let mut body = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "environment": environment,
        "missing_vars": missing_vars,
        "backend": state.relay.backend_name(),
    });
    if let Err(e) = storage {
        tracing::warn!(error = %e, "Storage health check failed");
        body["error"] = json!("storage unavailable");
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready" })),
        ),
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
