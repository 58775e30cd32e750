//! Decoding errors.

use thiserror::Error;

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Not a readable TIFF: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Raster has no georeferencing (needs ModelPixelScale + ModelTiepoint or ModelTransformation)")]
    MissingGeoreference,

    #[error("Invalid georeferencing: {0}")]
    InvalidGeoreference(String),

    #[error("Empty raster ({width}x{height})")]
    EmptyRaster { width: usize, height: usize },

    #[error("{samples} samples do not divide into {width}x{height} pixels")]
    SampleCountMismatch {
        samples: usize,
        width: usize,
        height: usize,
    },

    #[error("Unsupported sample format")]
    UnsupportedSampleFormat,
}

impl From<DecodeError> for overlay_common::OverlayError {
    fn from(err: DecodeError) -> Self {
        overlay_common::OverlayError::Decode(err.to_string())
    }
}
