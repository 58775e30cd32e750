//! GeoTIFF decoding.
//!
//! Turns the bytes of a single- or multi-band GeoTIFF into a
//! [`DecodedRaster`]: the value grid, band count, geographic bounds, pixel
//! size and the affine mapping from coordinates to pixel indices. The TIFF
//! container itself is decoded by the `tiff` crate; this crate reads the
//! GeoTIFF georeferencing tags on top of it.

pub mod decoder;
pub mod error;
pub mod raster;
pub mod transform;

pub use decoder::decode;
pub use error::{DecodeError, DecodeResult};
pub use raster::{DecodedRaster, PixelIndex};
pub use transform::GeoTransform;

/// GeoTIFF tag codes read by the decoder.
pub mod tags {
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const MODEL_TRANSFORMATION: u16 = 34264;
    pub const GDAL_NODATA: u16 = 42113;
}
