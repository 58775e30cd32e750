//! Error types for the raster overlay service.

use thiserror::Error;

use crate::style::StyleError;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    // === Layer Lifecycle Errors ===
    #[error("Layer '{layer}' is not available yet (state: {state})")]
    LayerNotReady { layer: String, state: String },

    #[error("Layer '{layer}' failed to load: {reason}")]
    LayerFailed { layer: String, reason: String },

    #[error("Invalid state transition for layer '{layer}': {from} -> {to}")]
    InvalidTransition {
        layer: String,
        from: String,
        to: String,
    },

    #[error("Map controller has been torn down")]
    ControllerClosed,

    // === Data Errors ===
    #[error("Failed to fetch raster: {0}")]
    Fetch(String),

    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Invalid style: {0}")]
    Style(#[from] StyleError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl OverlayError {
    /// Short machine-readable code for JSON error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            OverlayError::MissingParameter(_) => "MissingParameterValue",
            OverlayError::InvalidParameter { .. } => "InvalidParameterValue",
            OverlayError::LayerNotFound(_) => "LayerNotDefined",
            OverlayError::LayerNotReady { .. } => "LayerNotReady",
            OverlayError::LayerFailed { .. } => "LayerUnavailable",
            OverlayError::ControllerClosed => "ServiceClosed",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            OverlayError::MissingParameter(_)
            | OverlayError::InvalidParameter { .. }
            | OverlayError::Style(_) => 400,

            OverlayError::LayerNotFound(_) => 404,

            OverlayError::InvalidTransition { .. } => 409,

            OverlayError::LayerFailed { .. } | OverlayError::Fetch(_) => 502,

            OverlayError::LayerNotReady { .. } | OverlayError::ControllerClosed => 503,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Internal(format!("JSON error: {}", err))
    }
}
