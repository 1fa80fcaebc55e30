use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub configured: bool,
    pub stored_signals: usize,
    pub sse_subscribers: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stored_signals = state.signals.read().await.stats().total_stored;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        configured: state.applet.is_configured(),
        stored_signals,
        sse_subscribers: state.sse_subscriber_count.load(Ordering::Relaxed),
    })
}

/// GET /ready: ready once a repository is selected.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if !state.applet.is_configured() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready: no repository configured",
        );
    }
    (StatusCode::OK, "ready")
}
