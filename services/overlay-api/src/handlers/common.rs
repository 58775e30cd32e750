//! Shared handler utilities: JSON error bodies and response formats.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use overlay_common::{OverlayError, OverlayResult};
use serde::Serialize;
use tracing::{error, warn};

/// Handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`OverlayError`] rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError(pub OverlayError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl From<OverlayError> for ApiError {
    fn from(err: OverlayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            match status {
                StatusCode::INTERNAL_SERVER_ERROR => error!(error = %self.0, "Request failed"),
                _ => warn!(error = %self.0, status = status.as_u16(), "Layer unavailable"),
            }
        }

        let body = ErrorBody {
            error: self.0.error_code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Response Formats
// ============================================================================

/// `format=` values accepted by the inspect and legend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Html,
    Text,
}

impl ResponseFormat {
    /// Parse an optional `format` parameter. Accepts short names and MIME types.
    pub fn parse(value: Option<&str>) -> OverlayResult<Self> {
        let Some(value) = value else {
            return Ok(Self::Json);
        };
        match value.to_ascii_lowercase().as_str() {
            "" | "json" | "application/json" => Ok(Self::Json),
            "html" | "text/html" => Ok(Self::Html),
            "text" | "text/plain" => Ok(Self::Text),
            other => Err(OverlayError::InvalidParameter {
                param: "format".to_string(),
                message: format!("unsupported format '{}'", other),
            }),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(ResponseFormat::parse(None).unwrap(), ResponseFormat::Json);
        assert_eq!(
            ResponseFormat::parse(Some("text/html")).unwrap(),
            ResponseFormat::Html
        );
        assert_eq!(ResponseFormat::parse(Some("TEXT")).unwrap(), ResponseFormat::Text);
        assert!(matches!(
            ResponseFormat::parse(Some("xml")),
            Err(OverlayError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_error_status_mapping() {
        let response = ApiError(OverlayError::LayerNotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError(OverlayError::LayerFailed {
            layer: "rain".into(),
            reason: "404".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
