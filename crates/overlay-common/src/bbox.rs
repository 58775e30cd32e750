//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in the raster's coordinate system.
///
/// For EPSG:4326 rasters `x` is longitude and `y` is latitude, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Extent along x (degrees of longitude for geographic rasters).
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Finite and non-empty.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Closed-interval test: points on any edge are inside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Corner pair in `[[south, west], [north, east]]` order, as map
    /// widgets expect for `fitBounds` and image overlays.
    pub fn to_lat_lng_bounds(&self) -> [[f64; 2]; 2] {
        [[self.min_y, self.min_x], [self.max_y, self.max_x]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_bounds_order() {
        let bbox = BoundingBox::new(2.8, 6.5, 3.2, 6.9);
        assert_eq!(bbox.to_lat_lng_bounds(), [[6.5, 2.8], [6.9, 3.2]]);
    }
}
