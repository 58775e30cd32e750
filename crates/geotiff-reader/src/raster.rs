//! Decoded, georeferenced value grids.

use overlay_common::{BoundingBox, RasterSample};

use crate::error::{DecodeError, DecodeResult};
use crate::transform::GeoTransform;

/// Row / column of a pixel, row 0 at the top of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelIndex {
    pub row: usize,
    pub col: usize,
}

/// A decoded raster with its georeferencing.
///
/// Values are pixel-interleaved: the `band_count` samples of a pixel are
/// adjacent, pixels run row-major from the top-left corner.
#[derive(Debug, Clone)]
pub struct DecodedRaster {
    width: usize,
    height: usize,
    band_count: usize,
    values: Vec<f32>,
    transform: GeoTransform,
    nodata: Option<f64>,
}

impl DecodedRaster {
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f32>,
        transform: GeoTransform,
        nodata: Option<f64>,
    ) -> DecodeResult<Self> {
        let pixels = width * height;
        if pixels == 0 {
            return Err(DecodeError::EmptyRaster { width, height });
        }
        if values.is_empty() || values.len() % pixels != 0 {
            return Err(DecodeError::SampleCountMismatch {
                samples: values.len(),
                width,
                height,
            });
        }

        Ok(Self {
            width,
            height,
            band_count: values.len() / pixels,
            values,
            transform,
            nodata,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Raw interleaved values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Absolute pixel size `(x, y)` in coordinate units.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            self.transform.pixel_width.abs(),
            self.transform.pixel_height.abs(),
        )
    }

    /// Geographic extent covering all four image corners.
    pub fn bounds(&self) -> BoundingBox {
        let (w, h) = (self.width as f64, self.height as f64);
        let corners = [
            self.transform.pixel_to_geo(0.0, 0.0),
            self.transform.pixel_to_geo(w, 0.0),
            self.transform.pixel_to_geo(0.0, h),
            self.transform.pixel_to_geo(w, h),
        ];
        corners.iter().skip(1).fold(
            BoundingBox::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1),
            |acc, &(x, y)| {
                BoundingBox::new(
                    acc.min_x.min(x),
                    acc.min_y.min(y),
                    acc.max_x.max(x),
                    acc.max_y.max(y),
                )
            },
        )
    }

    /// Pixel containing `(lat, lng)`, or `None` outside the image.
    ///
    /// Edges are inclusive like [`BoundingBox::contains_point`]: a point on
    /// the east or south edge lands in the last column or row.
    pub fn coordinate_to_index(&self, lat: f64, lng: f64) -> Option<PixelIndex> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        let (col, row) = self.transform.geo_to_pixel(lng, lat);
        Some(PixelIndex {
            row: pixel_position(row, self.height)?,
            col: pixel_position(col, self.width)?,
        })
    }

    /// One band at a pixel, with no-data and NaN reported as `None`.
    pub fn band_value(&self, index: PixelIndex, band: usize) -> Option<f64> {
        if band >= self.band_count || index.row >= self.height || index.col >= self.width {
            return None;
        }
        let offset = (index.row * self.width + index.col) * self.band_count + band;
        self.values
            .get(offset)
            .copied()
            .and_then(|v| self.usable(v))
    }

    /// All bands at a pixel. Bands equal to the no-data value become NaN;
    /// a pixel with no usable band at all is `RasterSample::NoData`.
    pub fn sample_at(&self, index: PixelIndex) -> RasterSample {
        if index.row >= self.height || index.col >= self.width {
            return RasterSample::NoData;
        }
        let start = (index.row * self.width + index.col) * self.band_count;
        let bands: Vec<f64> = self.values[start..start + self.band_count]
            .iter()
            .map(|&v| self.usable(v).unwrap_or(f64::NAN))
            .collect();

        if bands.iter().all(|v| v.is_nan()) {
            RasterSample::NoData
        } else {
            RasterSample::Bands(bands)
        }
    }

    /// Sample at a geographic coordinate; `NoData` outside the image.
    pub fn sample_at_coordinate(&self, lat: f64, lng: f64) -> RasterSample {
        self.coordinate_to_index(lat, lng)
            .map(|index| self.sample_at(index))
            .unwrap_or_default()
    }

    /// Iterate one band in row-major order, no-data as `None`.
    pub fn band(&self, band: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        let step = self.band_count;
        let valid = band < step;
        self.values
            .iter()
            .skip(band)
            .step_by(step)
            .take(if valid { self.width * self.height } else { 0 })
            .map(move |&v| self.usable(v))
    }

    fn usable(&self, value: f32) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        match self.nodata {
            Some(nodata) if value == nodata as f32 => None,
            _ => Some(value as f64),
        }
    }
}

/// Whole pixel for a fractional position in `[0, len]`; `len` maps to the last pixel.
fn pixel_position(position: f64, len: usize) -> Option<usize> {
    const EDGE_EPSILON: f64 = 1e-9;
    let last = len.checked_sub(1)?;
    if position < 0.0 || position > len as f64 + EDGE_EPSILON {
        return None;
    }
    Some((position.floor() as usize).min(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_3x2() -> DecodedRaster {
        // 3 columns, 2 rows, one band, 1 degree pixels, top-left at (0, 2).
        DecodedRaster::new(
            3,
            2,
            vec![0.1, 0.2, 0.3, 0.4, -9999.0, f32::NAN],
            GeoTransform::north_up(0.0, 2.0, 1.0, 1.0),
            Some(-9999.0),
        )
        .unwrap()
    }

    #[test]
    fn test_bounds_and_pixel_size() {
        let raster = raster_3x2();
        assert_eq!(raster.bounds(), BoundingBox::new(0.0, 0.0, 3.0, 2.0));
        assert_eq!(raster.pixel_size(), (1.0, 1.0));
    }

    #[test]
    fn test_coordinate_to_index_flips_latitude() {
        let raster = raster_3x2();
        assert_eq!(
            raster.coordinate_to_index(1.5, 0.5),
            Some(PixelIndex { row: 0, col: 0 })
        );
        assert_eq!(
            raster.coordinate_to_index(0.5, 2.5),
            Some(PixelIndex { row: 1, col: 2 })
        );
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let raster = raster_3x2();
        assert_eq!(raster.coordinate_to_index(2.5, 0.5), None);
        assert_eq!(raster.coordinate_to_index(1.0, -0.1), None);
        assert_eq!(raster.coordinate_to_index(1.0, 3.01), None);
        assert_eq!(raster.coordinate_to_index(-0.01, 1.0), None);
        assert_eq!(raster.coordinate_to_index(f64::NAN, 1.0), None);
        assert_eq!(raster.sample_at_coordinate(50.0, 50.0), RasterSample::NoData);
    }

    #[test]
    fn test_edges_are_inclusive() {
        let raster = raster_3x2();
        let bounds = raster.bounds();
        let corners = [
            (bounds.min_y, bounds.min_x),
            (bounds.min_y, bounds.max_x),
            (bounds.max_y, bounds.min_x),
            (bounds.max_y, bounds.max_x),
        ];
        for (lat, lng) in corners {
            assert!(bounds.contains_point(lng, lat));
            assert!(raster.coordinate_to_index(lat, lng).is_some(), "({}, {})", lat, lng);
        }
        assert_eq!(
            raster.coordinate_to_index(0.0, 3.0),
            Some(PixelIndex { row: 1, col: 2 })
        );
        assert_eq!(
            raster.coordinate_to_index(2.0, 0.0),
            Some(PixelIndex { row: 0, col: 0 })
        );
    }

    #[test]
    fn test_nodata_and_nan_samples() {
        let raster = raster_3x2();
        assert_eq!(raster.sample_at(PixelIndex { row: 1, col: 1 }), RasterSample::NoData);
        assert_eq!(raster.sample_at(PixelIndex { row: 1, col: 2 }), RasterSample::NoData);
        let sample = raster.sample_at(PixelIndex { row: 0, col: 1 });
        assert!((sample.band(0).unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_multiband_interleaving() {
        let raster = DecodedRaster::new(
            2,
            1,
            vec![1.0, 10.0, 2.0, 20.0],
            GeoTransform::north_up(0.0, 1.0, 1.0, 1.0),
            None,
        )
        .unwrap();
        assert_eq!(raster.band_count(), 2);
        let second = raster.sample_at(PixelIndex { row: 0, col: 1 });
        assert_eq!(second.bands(), &[2.0, 20.0]);
        let band1: Vec<Option<f64>> = raster.band(1).collect();
        assert_eq!(band1, vec![Some(10.0), Some(20.0)]);
        assert_eq!(raster.band(2).count(), 0);
    }

    #[test]
    fn test_rejects_bad_sample_count() {
        let err = DecodedRaster::new(
            2,
            2,
            vec![1.0, 2.0, 3.0],
            GeoTransform::north_up(0.0, 0.0, 1.0, 1.0),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::SampleCountMismatch { .. }));
    }
}
