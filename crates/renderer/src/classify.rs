//! Applying a threshold classifier over a decoded raster.

use geotiff_reader::{DecodedRaster, PixelIndex};
use overlay_common::ThresholdClassifier;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::png::{encode_indexed, MAX_PALETTE_SIZE};

/// Rows at or above this count are classified in parallel.
const PARALLEL_ROW_THRESHOLD: usize = 64;

/// A raster reduced to one palette index per pixel.
///
/// Index `r` is class rank `r`; the last palette entry is the fully
/// transparent no-data color.
#[derive(Debug, Clone)]
pub struct ClassifiedImage {
    pub width: usize,
    pub height: usize,
    pub indices: Vec<u8>,
    pub palette: Vec<[u8; 4]>,
}

impl ClassifiedImage {
    /// Palette index used for no-data pixels.
    pub fn nodata_index(&self) -> u8 {
        (self.palette.len() - 1) as u8
    }

    /// Pixel count per palette entry, no-data last.
    pub fn histogram(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.palette.len()];
        for &i in &self.indices {
            counts[i as usize] += 1;
        }
        counts
    }

    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        encode_indexed(self.width, self.height, &self.palette, &self.indices)
    }
}

/// Class colors with `opacity` applied, followed by transparent no-data.
pub fn overlay_palette(classifier: &ThresholdClassifier, opacity: f32) -> RenderResult<Vec<[u8; 4]>> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(RenderError::InvalidOpacity(opacity));
    }
    let mut palette: Vec<[u8; 4]> = classifier
        .palette()
        .iter()
        .map(|c| c.with_opacity(opacity).to_rgba())
        .collect();
    palette.push([0, 0, 0, 0]);

    if palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::PaletteSize(palette.len()));
    }
    Ok(palette)
}

/// Classify one band of `raster` into palette indices.
pub fn classify_raster(
    raster: &DecodedRaster,
    classifier: &ThresholdClassifier,
    band: usize,
    opacity: f32,
) -> RenderResult<ClassifiedImage> {
    if band >= raster.band_count() {
        return Err(RenderError::BandOutOfRange {
            band,
            band_count: raster.band_count(),
        });
    }

    let palette = overlay_palette(classifier, opacity)?;
    let nodata = (palette.len() - 1) as u8;
    let (width, height) = (raster.width(), raster.height());
    let mut indices = vec![nodata; width * height];

    let classify_row = |(row, out): (usize, &mut [u8])| {
        for (col, slot) in out.iter_mut().enumerate() {
            *slot = raster
                .band_value(PixelIndex { row, col }, band)
                .and_then(|v| classifier.rank_value(v))
                .map(|rank| rank as u8)
                .unwrap_or(nodata);
        }
    };

    if height >= PARALLEL_ROW_THRESHOLD {
        indices
            .par_chunks_mut(width)
            .enumerate()
            .for_each(classify_row);
    } else {
        indices.chunks_mut(width).enumerate().for_each(classify_row);
    }

    Ok(ClassifiedImage {
        width,
        height,
        indices,
        palette,
    })
}

/// Classify and encode a PNG overlay in one step.
pub fn render_overlay(
    raster: &DecodedRaster,
    classifier: &ThresholdClassifier,
    band: usize,
    opacity: f32,
) -> RenderResult<Vec<u8>> {
    let image = classify_raster(raster, classifier, band, opacity)?;
    let png = image.to_png()?;
    debug!(
        width = image.width,
        height = image.height,
        bytes = png.len(),
        "Rendered classified overlay"
    );
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotiff_reader::GeoTransform;

    fn raster(values: Vec<f32>, width: usize, height: usize) -> DecodedRaster {
        DecodedRaster::new(
            width,
            height,
            values,
            GeoTransform::north_up(0.0, height as f64, 1.0, 1.0),
            Some(-9999.0),
        )
        .unwrap()
    }

    #[test]
    fn test_indices_are_class_ranks() {
        let r = raster(vec![0.1, 0.3, 0.6, 0.9], 4, 1);
        let image = classify_raster(&r, &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
        assert_eq!(image.indices, vec![0, 1, 2, 3]);
        assert_eq!(image.palette.len(), 5);
    }

    #[test]
    fn test_nodata_and_nan_are_transparent() {
        let r = raster(vec![-9999.0, f32::NAN, 0.5], 3, 1);
        let image = classify_raster(&r, &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
        let nodata = image.nodata_index();
        assert_eq!(image.indices, vec![nodata, nodata, 1]);
        assert_eq!(image.palette[nodata as usize], [0, 0, 0, 0]);
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let palette = overlay_palette(&ThresholdClassifier::ndvi(), 0.5).unwrap();
        assert_eq!(palette[0], [255, 255, 255, 128]);
        assert_eq!(palette[3], [0, 77, 0, 128]);
    }

    #[test]
    fn test_rejects_bad_opacity_and_band() {
        let r = raster(vec![0.1], 1, 1);
        assert!(matches!(
            classify_raster(&r, &ThresholdClassifier::ndvi(), 0, 1.5),
            Err(RenderError::InvalidOpacity(_))
        ));
        assert!(matches!(
            classify_raster(&r, &ThresholdClassifier::ndvi(), 1, 1.0),
            Err(RenderError::BandOutOfRange { band: 1, band_count: 1 })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential_layout() {
        let (w, h) = (5, PARALLEL_ROW_THRESHOLD + 3);
        let values: Vec<f32> = (0..w * h).map(|i| (i % w) as f32 * 0.2).collect();
        let image =
            classify_raster(&raster(values, w, h), &ThresholdClassifier::ndvi(), 0, 1.0).unwrap();
        let expected_row = [0u8, 0, 1, 2, 3];
        for row in image.indices.chunks(w) {
            assert_eq!(row, expected_row);
        }
    }
}
