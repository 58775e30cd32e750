//! Map description for clients.

use axum::{
    extract::{Extension, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use super::common::{ApiResult, ResponseFormat};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub format: Option<String>,
}

/// GET /api/map - view, title banner, layer statuses and active layer
#[instrument(skip(state))]
pub async fn map_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let snapshot = state.controller.read().await.snapshot();
    Json(snapshot).into_response()
}

/// GET /api/map/title - title banner as JSON or an HTML fragment
#[instrument(skip(state))]
pub async fn title_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TitleQuery>,
) -> ApiResult<Response> {
    let format = ResponseFormat::parse(query.format.as_deref())?;
    let title = state.controller.read().await.title().clone();

    Ok(match format {
        ResponseFormat::Json => Json(title).into_response(),
        ResponseFormat::Html => {
            ([(header::CONTENT_TYPE, format.content_type())], title.to_html()).into_response()
        }
        ResponseFormat::Text => {
            let mut text = title.title;
            for line in [title.subtitle, title.credit].into_iter().flatten() {
                text.push('\n');
                text.push_str(&line);
            }
            ([(header::CONTENT_TYPE, format.content_type())], text).into_response()
        }
    })
}
