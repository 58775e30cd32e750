//! Health, readiness and metrics endpoints.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::instrument;

use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /ready - 200 once any layer is Ready
#[instrument(skip(state))]
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let controller = state.controller.read().await;
    if !controller.is_closed() && controller.registry().ready().next().is_some() {
        (StatusCode::OK, "Ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
    }
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(handle: Option<Extension<PrometheusHandle>>) -> Response {
    match handle {
        Some(Extension(handle)) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics exporter not installed").into_response(),
    }
}

/// GET /api/metrics - request counters as JSON
#[instrument(skip(state))]
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
