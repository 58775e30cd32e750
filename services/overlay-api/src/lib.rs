//! Raster overlay API service library.
//!
//! Loads the configured GeoTIFF layers in the background and serves their
//! classified overlays, legends, load state and click-to-inspect answers.

pub mod controller;
pub mod handlers;
pub mod layer_config;
pub mod loader;
pub mod metrics;
pub mod registry;
pub mod state;
pub mod surface;

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use controller::SharedController;
use state::AppState;

/// Build the HTTP router. `prometheus` backs `/metrics` when installed.
pub fn build_router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/metrics", get(handlers::api_metrics_handler))
        // Map
        .route("/api/map", get(handlers::map_handler))
        .route("/api/map/title", get(handlers::title_handler))
        .route("/api/events", get(handlers::events_handler))
        // Layers
        .route("/api/layers", get(handlers::list_layers_handler))
        .route("/api/layers/:id", get(handlers::layer_handler))
        .route("/api/layers/:id/visibility", put(handlers::set_visibility_handler))
        .route("/api/layers/:id/active", put(handlers::set_active_handler))
        .route("/api/layers/:id/overlay.png", get(handlers::overlay_handler))
        .route("/api/layers/:id/legend", get(handlers::legend_handler))
        // Inspect
        .route("/api/inspect", get(handlers::inspect_handler));

    let router = match prometheus {
        Some(handle) => router.layer(Extension(handle)),
        None => router,
    };

    router
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// Serve `router` until `signal` resolves, then drain connections.
///
/// The controller is torn down as soon as the signal fires, before draining:
/// `/api/events` streams only end on `Detached`, so they would otherwise
/// hold the server open.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    controller: SharedController,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            controller.write().await.teardown();
            info!("Draining open connections");
        })
        .await
}
