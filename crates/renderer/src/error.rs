//! Rendering errors.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Expected {expected} pixels, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Palette must have 1..=256 entries, got {0}")]
    PaletteSize(usize),

    #[error("Pixel index {index} outside palette of {palette} entries")]
    IndexOutOfPalette { index: u8, palette: usize },

    #[error("Band {band} requested from a {band_count}-band raster")]
    BandOutOfRange { band: usize, band_count: usize },

    #[error("Opacity must be within [0, 1], got {0}")]
    InvalidOpacity(f32),

    #[error("Compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

impl From<RenderError> for overlay_common::OverlayError {
    fn from(err: RenderError) -> Self {
        overlay_common::OverlayError::Render(err.to_string())
    }
}
