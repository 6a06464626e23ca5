//! Liveness and metrics handlers.

use super::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// GET /health - static liveness, independent of ping outcomes.
pub async fn handle() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /metrics - Prometheus text format.
///
/// Always 200; the body is empty when no recorder is installed.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
