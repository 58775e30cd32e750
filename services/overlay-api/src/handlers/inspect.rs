//! Click-to-inspect, answered like a GetFeatureInfo popup.

use axum::{
    extract::{Extension, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use overlay_common::{escape_html, OverlayError, OverlayResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::common::{ApiResult, ResponseFormat};
use crate::controller::{InspectResult, MapController};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InspectQuery {
    pub lat: Option<String>,
    #[serde(alias = "lon")]
    pub lng: Option<String>,
    pub format: Option<String>,
    /// `true` answers for every Ready layer instead of the active one.
    pub all: Option<bool>,
}

/// Parse a required coordinate. Any finite value is accepted: clicks on a
/// wrapped copy of the world report longitudes past 180 and simply miss
/// every raster.
fn parse_coordinate(name: &str, value: Option<&str>) -> OverlayResult<f64> {
    let raw = value.ok_or_else(|| OverlayError::MissingParameter(name.to_string()))?;
    match raw.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(OverlayError::InvalidParameter {
            param: name.to_string(),
            message: format!("'{}' is not a finite number", raw),
        }),
    }
}

/// GET /api/inspect?lat=&lng=&format=json|html|text[&all=true]
#[instrument(skip(state))]
pub async fn inspect_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<InspectQuery>,
) -> ApiResult<Response> {
    let lat = parse_coordinate("lat", query.lat.as_deref())?;
    let lng = parse_coordinate("lng", query.lng.as_deref())?;
    let format = ResponseFormat::parse(query.format.as_deref())?;

    let controller = state.controller.read().await;
    let results = if query.all.unwrap_or(false) {
        controller.inspect_all(lat, lng)
    } else {
        vec![controller.inspect(lat, lng)]
    };

    let no_data = results.iter().all(InspectResult::is_no_data);
    state.metrics.record_inspect(no_data);
    debug!(lat, lng, results = results.len(), no_data, "Inspect");

    let response = match format {
        ResponseFormat::Json if query.all.unwrap_or(false) => Json(results).into_response(),
        ResponseFormat::Json => match results.into_iter().next() {
            Some(result) => Json(result).into_response(),
            None => Json(serde_json::Value::Null).into_response(),
        },
        ResponseFormat::Html => {
            let body: Vec<String> = results
                .iter()
                .map(|r| format_html(&controller, r))
                .collect();
            ([(header::CONTENT_TYPE, format.content_type())], body.join("\n")).into_response()
        }
        ResponseFormat::Text => {
            let body: Vec<String> = results
                .iter()
                .map(|r| format_text(&controller, r))
                .collect();
            ([(header::CONTENT_TYPE, format.content_type())], body.join("\n\n")).into_response()
        }
    };
    Ok(response)
}

fn layer_title(controller: &MapController, result: &InspectResult) -> String {
    result
        .layer
        .as_ref()
        .and_then(|id| controller.descriptor(id.as_str()))
        .map(|d| d.title.clone())
        .unwrap_or_else(|| "No layer loaded".to_string())
}

fn format_value(result: &InspectResult) -> String {
    result
        .sample
        .bands()
        .iter()
        .map(|v| {
            if v.is_nan() {
                "NaN".to_string()
            } else {
                format!("{:.3}", v)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain-text popup body.
pub fn format_text(controller: &MapController, result: &InspectResult) -> String {
    let mut text = format!(
        "{}\nLocation: {:.5}, {:.5}\n",
        layer_title(controller, result),
        result.lat,
        result.lng
    );
    match &result.class {
        Some(class) if !result.is_no_data() => {
            text.push_str(&format!("Value: {}\nClass: {}", format_value(result), class.label));
        }
        _ => text.push_str("No data at this location"),
    }
    text
}

/// HTML popup fragment with a class swatch.
pub fn format_html(controller: &MapController, result: &InspectResult) -> String {
    let mut html = format!(
        "<div class=\"inspect\">\n  <strong>{}</strong><br/>\n",
        escape_html(&layer_title(controller, result))
    );
    match &result.class {
        Some(class) if !result.is_no_data() => {
            html.push_str(&format!("  Value: {}<br/>\n", format_value(result)));
            html.push_str(&format!(
                "  <i style=\"background:{}; width:12px; height:12px; display:inline-block; margin-right:6px;\"></i>{}\n",
                class.color,
                escape_html(&class.label)
            ));
        }
        _ => html.push_str("  <em>No data at this location</em>\n"),
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("lat", Some(" 6.65 ")).unwrap(), 6.65);
        assert!(matches!(
            parse_coordinate("lat", None),
            Err(OverlayError::MissingParameter(_))
        ));
        assert!(matches!(
            parse_coordinate("lat", Some("north")),
            Err(OverlayError::InvalidParameter { .. })
        ));
        assert!(parse_coordinate("lng", Some("NaN")).is_err());
        assert!(parse_coordinate("lng", Some("inf")).is_err());
    }

    #[test]
    fn test_parse_coordinate_accepts_wrapped_longitude() {
        assert_eq!(parse_coordinate("lng", Some("362.9")).unwrap(), 362.9);
        assert_eq!(parse_coordinate("lng", Some("-185")).unwrap(), -185.0);
        assert_eq!(parse_coordinate("lat", Some("91")).unwrap(), 91.0);
    }
}
