use crate::error::{ServerError, ServerResult};
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn metadata() -> ServerMetadata {
    ServerMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: SERVER_START_TIME
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or(0),
    }
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    let meta = metadata();

    Json(json!({
        "status": "healthy",
        "service": "material-server",
        "version": meta.version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": meta.uptime_seconds,
    }))
}

/// Readiness check endpoint
/// Returns 200 once the document store answers a ping, 503 otherwise
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let meta = metadata();
    let backend = state.store.name();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": "material-server",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "uptime_seconds": meta.uptime_seconds,
                "components": { "store": backend },
            })),
        ),
        Err(err) => {
            tracing::warn!(error = %err, backend, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "service": "material-server",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "uptime_seconds": meta.uptime_seconds,
                    "components": { "store": backend },
                    "error": err.to_string(),
                })),
            )
        }
    }
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ServerError::NotFound("Metrics disabled".to_string()))?;
    Ok(handle.render())
}
