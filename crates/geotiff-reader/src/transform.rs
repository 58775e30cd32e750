//! Affine pixel <-> coordinate mapping.

use crate::error::{DecodeError, DecodeResult};

/// Affine transform from pixel space to the raster's coordinate space.
///
/// `x = origin_x + col * pixel_width + row * rotation_x`
/// `y = origin_y + col * rotation_y + row * pixel_height`
///
/// `(col, row)` address pixel corners: `(0, 0)` is the outer corner of the
/// first pixel. North-up rasters have a negative `pixel_height`, which is
/// where the latitude flip between rows and coordinates comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub rotation_x: f64,
    pub rotation_y: f64,
}

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height: -pixel_height.abs(),
            rotation_x: 0.0,
            rotation_y: 0.0,
        }
    }

    /// From `ModelTiepoint` `[I, J, K, X, Y, Z]` and `ModelPixelScale`
    /// `[ScaleX, ScaleY, ScaleZ]`.
    pub fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> DecodeResult<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 {
            return Err(DecodeError::InvalidGeoreference(format!(
                "tiepoint has {} values and pixel scale {}, need 6 and 2",
                tiepoint.len(),
                scale.len()
            )));
        }

        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (scale_x, scale_y) = (scale[0], scale[1]);

        let transform = Self {
            origin_x: x - i * scale_x,
            origin_y: y + j * scale_y,
            pixel_width: scale_x,
            pixel_height: -scale_y,
            rotation_x: 0.0,
            rotation_y: 0.0,
        };
        transform.validate()?;
        Ok(transform)
    }

    /// From a row-major 4x4 `ModelTransformation` matrix.
    pub fn from_model_transformation(matrix: &[f64]) -> DecodeResult<Self> {
        if matrix.len() < 16 {
            return Err(DecodeError::InvalidGeoreference(format!(
                "model transformation has {} values, need 16",
                matrix.len()
            )));
        }

        let transform = Self {
            origin_x: matrix[3],
            origin_y: matrix[7],
            pixel_width: matrix[0],
            pixel_height: matrix[5],
            rotation_x: matrix[1],
            rotation_y: matrix[4],
        };
        transform.validate()?;
        Ok(transform)
    }

    fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y
    }

    fn validate(&self) -> DecodeResult<()> {
        let values = [
            self.origin_x,
            self.origin_y,
            self.pixel_width,
            self.pixel_height,
            self.rotation_x,
            self.rotation_y,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DecodeError::InvalidGeoreference(
                "non-finite transform coefficient".to_string(),
            ));
        }
        if self.determinant().abs() < f64::EPSILON {
            return Err(DecodeError::InvalidGeoreference(
                "transform is singular (zero pixel size)".to_string(),
            ));
        }
        Ok(())
    }

    /// Pixel-space `(col, row)` to coordinates `(x, y)`.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.origin_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }

    /// Coordinates `(x, y)` to fractional pixel-space `(col, row)`.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.determinant();
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (self.pixel_height * dx - self.rotation_x * dy) / det;
        let row = (self.pixel_width * dy - self.rotation_y * dx) / det;
        (col, row)
    }
}
