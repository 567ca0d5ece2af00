//! Health check HTTP handlers

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::web::{
    AppState,
    extractors::RequestContext,
    responses::{CacheHealth, HealthResponse, ok, service_unavailable},
};

/// Application health with cache occupancy
pub async fn health_check(State(state): State<AppState>, context: RequestContext) -> impl IntoResponse {
    debug!(request_id = %context.request_id, "Health check");

    let cache = state.preview_service.cache();
    let uptime = (chrono::Utc::now() - state.start_time).num_seconds();

    ok(HealthResponse::healthy(
        uptime,
        CacheHealth {
            len: cache.len(),
            capacity: cache.capacity(),
        },
    ))
}

/// Readiness check (for Kubernetes probes); requires the storage directory
pub async fn readiness_check(State(state): State<AppState>, context: RequestContext) -> Response {
    debug!(request_id = %context.request_id, "Readiness check");

    if state.preview_service.storage().is_available().await {
        ok(serde_json::json!({
            "status": "ready",
            "timestamp": chrono::Utc::now()
        }))
        .into_response()
    } else {
        service_unavailable(format!(
            "storage directory {} is not available",
            state.preview_service.storage().root().display()
        ))
        .into_response()
    }
}

/// Liveness check (for Kubernetes probes)
pub async fn liveness_check(_context: RequestContext) -> impl IntoResponse {
    ok(serde_json::json!({
        "status": "alive",
        "timestamp": chrono::Utc::now()
    }))
}
