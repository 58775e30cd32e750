//! Layer status, toggling, overlay images and legends.

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use overlay_common::OverlayError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use super::common::{ApiResult, ResponseFormat};
use crate::controller::{LayerStatus, OverlaySource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

#[derive(Debug, Deserialize)]
pub struct LegendQuery {
    pub format: Option<String>,
}

/// GET /api/layers - every registered layer with its load state
#[instrument(skip(state))]
pub async fn list_layers_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Vec<LayerStatus>> {
    Json(state.controller.read().await.layer_statuses())
}

/// GET /api/layers/:id
#[instrument(skip(state))]
pub async fn layer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<LayerStatus>> {
    Ok(Json(state.controller.read().await.layer_status(&id)?))
}

/// PUT /api/layers/:id/visibility - body `{ "visible": bool }`
#[instrument(skip(state))]
pub async fn set_visibility_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> ApiResult<Json<LayerStatus>> {
    let mut controller = state.controller.write().await;
    controller.set_visibility(&id, request.visible)?;
    Ok(Json(controller.layer_status(&id)?))
}

/// PUT /api/layers/:id/active - make a Ready layer the inspected one
#[instrument(skip(state))]
pub async fn set_active_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<LayerStatus>> {
    let mut controller = state.controller.write().await;
    controller.set_active(&id)?;
    Ok(Json(controller.layer_status(&id)?))
}

/// GET /api/layers/:id/overlay.png - classified overlay image
///
/// 404 for unknown layers, 503 while loading, 502 with the reason when the
/// load failed.
#[instrument(skip(state))]
pub async fn overlay_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    // Clone what the renderer needs and release the lock before rendering.
    let source = state.controller.read().await.overlay_source(&id)?;

    let start = Instant::now();
    let result = render(source).await;
    state
        .metrics
        .record_render(&id, start.elapsed(), result.is_ok());
    let png = result?;

    info!(layer = %id, bytes = png.len(), "Overlay rendered");
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "max-age=300"),
        ],
        png,
    )
        .into_response())
}

async fn render(source: OverlaySource) -> Result<Vec<u8>, OverlayError> {
    tokio::task::spawn_blocking(move || {
        renderer::render_overlay(
            &source.raster,
            &source.classifier,
            source.band,
            source.opacity,
        )
    })
    .await
    .map_err(|e| OverlayError::Internal(format!("render task failed: {}", e)))?
    .map_err(OverlayError::from)
}

/// GET /api/layers/:id/legend - legend as JSON, or HTML with `format=html`
#[instrument(skip(state))]
pub async fn legend_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LegendQuery>,
) -> ApiResult<Response> {
    let format = ResponseFormat::parse(query.format.as_deref())?;
    let legend = state.controller.read().await.legend(&id)?;

    Ok(match format {
        ResponseFormat::Json => Json(legend).into_response(),
        ResponseFormat::Html => {
            ([(header::CONTENT_TYPE, format.content_type())], legend.to_html()).into_response()
        }
        ResponseFormat::Text => {
            let mut text = legend.title.clone();
            for entry in &legend.entries {
                text.push_str(&format!("\n{} {}", entry.color, entry.label));
            }
            ([(header::CONTENT_TYPE, format.content_type())], text).into_response()
        }
    })
}
