//! Health endpoint served next to the pinger.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /health` | `200 ok` |
//! | `GET /metrics` | Prometheus exposition text |

pub mod health;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
#[derive(Default)]
pub struct AppState {
    /// Renders recorded metrics; absent when no recorder was installed
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(prometheus: Option<PrometheusHandle>) -> Self {
        Self { prometheus }
    }
}

/// Build the health router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::handle))
        .route("/metrics", get(health::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
