//! Decoding synthetic and (when available) real district GeoTIFFs.

use geotiff_reader::{decode, DecodeError, PixelIndex};
use overlay_common::RasterSample;
use test_utils::{
    assert_approx_eq, ndvi_fixture, ndvi_geotiff, rainfall_geotiff, require_test_file,
    GeoTiffFixture, Georeference, ADO_ODO_OTA_BBOX, FIXTURE_NODATA, INSIDE_POINT, OUTSIDE_POINT,
};

// ============================================================================
// Dimensions and georeferencing
// ============================================================================

#[test]
fn test_decode_ndvi_fixture_dimensions() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    assert_eq!(raster.width(), 40);
    assert_eq!(raster.height(), 50);
    assert_eq!(raster.band_count(), 1);
    assert_eq!(raster.nodata(), Some(FIXTURE_NODATA));
}

#[test]
fn test_decode_bounds_match_extent() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let bounds = raster.bounds();
    let (min_x, min_y, max_x, max_y) = ADO_ODO_OTA_BBOX;
    assert_approx_eq!(bounds.min_x, min_x, 1e-9);
    assert_approx_eq!(bounds.min_y, min_y, 1e-9);
    assert_approx_eq!(bounds.max_x, max_x, 1e-9);
    assert_approx_eq!(bounds.max_y, max_y, 1e-9);

    let (px, py) = raster.pixel_size();
    assert_approx_eq!(px, 0.01, 1e-12);
    assert_approx_eq!(py, 0.01, 1e-12);
}

#[test]
fn test_model_transformation_matches_tiepoint() {
    let from_tiepoint = decode(&ndvi_geotiff()).unwrap();
    let bytes = ndvi_fixture()
        .georeference(Georeference::ModelTransformation)
        .encode()
        .unwrap();
    let from_matrix = decode(&bytes).unwrap();
    assert_eq!(from_tiepoint.bounds(), from_matrix.bounds());
}

#[test]
fn test_missing_georeference_is_rejected() {
    let bytes = GeoTiffFixture::new(2, 2, vec![0.1; 4])
        .georeference(Georeference::None)
        .encode()
        .unwrap();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, DecodeError::MissingGeoreference));
}

#[test]
fn test_garbage_bytes_are_rejected() {
    let err = decode(b"this is not a tiff").unwrap_err();
    assert!(matches!(err, DecodeError::Tiff(_)));
}

#[test]
fn test_empty_input_is_rejected() {
    assert!(decode(&[]).is_err());
}

// ============================================================================
// Point sampling
// ============================================================================

#[test]
fn test_sample_inside_extent() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let (lat, lng) = INSIDE_POINT;
    let index = raster.coordinate_to_index(lat, lng).unwrap();
    assert_eq!(index.col, 20);

    // Column 20 of 40 on a -0.2..1.0 ramp.
    let value = raster.sample_at_coordinate(lat, lng).band(0).unwrap();
    assert_approx_eq!(value, 0.4, 1e-6);
}

#[test]
fn test_sample_outside_extent_is_no_data() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    let (lat, lng) = OUTSIDE_POINT;
    assert!(raster.coordinate_to_index(lat, lng).is_none());
    assert_eq!(raster.sample_at_coordinate(lat, lng), RasterSample::NoData);
}

#[test]
fn test_border_pixel_is_no_data() {
    let raster = decode(&ndvi_geotiff()).unwrap();
    assert_eq!(
        raster.sample_at(PixelIndex { row: 0, col: 0 }),
        RasterSample::NoData
    );
    assert_eq!(raster.sample_at_coordinate(6.895, 2.705), RasterSample::NoData);
}

#[test]
fn test_rainfall_rows_increase_southward() {
    let raster = decode(&rainfall_geotiff()).unwrap();
    let north = raster.band_value(PixelIndex { row: 1, col: 5 }, 0).unwrap();
    let south = raster.band_value(PixelIndex { row: 48, col: 5 }, 0).unwrap();
    assert!(north < -70.0);
    assert!(south > 40.0);
}

// ============================================================================
// Bands and no-data encodings
// ============================================================================

#[test]
fn test_three_band_raster() {
    let values = vec![0.1, 10.0, 100.0, 0.2, 20.0, 200.0];
    let bytes = GeoTiffFixture::three_band(2, 1, values)
        .origin(3.0, 7.0)
        .pixel_size(0.5, 0.5)
        .encode()
        .unwrap();
    let raster = decode(&bytes).unwrap();
    assert_eq!(raster.band_count(), 3);

    let sample = raster.sample_at(PixelIndex { row: 0, col: 1 });
    assert_approx_eq!(sample.band(1).unwrap(), 20.0, 1e-6);
    assert_approx_eq!(sample.band(2).unwrap(), 200.0, 1e-6);
}

#[test]
fn test_nodata_text_with_trailing_nul() {
    let bytes = GeoTiffFixture::new(2, 1, vec![-3.0, 0.5])
        .nodata_text("-3\0")
        .encode()
        .unwrap();
    let raster = decode(&bytes).unwrap();
    assert_eq!(raster.nodata(), Some(-3.0));
    assert_eq!(
        raster.sample_at(PixelIndex { row: 0, col: 0 }),
        RasterSample::NoData
    );
}

#[test]
fn test_unparseable_nodata_is_ignored() {
    let bytes = GeoTiffFixture::new(1, 1, vec![0.5])
        .nodata_text("none")
        .encode()
        .unwrap();
    let raster = decode(&bytes).unwrap();
    assert_eq!(raster.nodata(), None);
}

#[test]
fn test_nan_pixels_are_no_data_without_tag() {
    let bytes = GeoTiffFixture::new(2, 1, vec![f32::NAN, 0.3]).encode().unwrap();
    let raster = decode(&bytes).unwrap();
    assert_eq!(
        raster.sample_at(PixelIndex { row: 0, col: 0 }),
        RasterSample::NoData
    );
    assert!(!raster.sample_at(PixelIndex { row: 0, col: 1 }).is_no_data());
}

// ============================================================================
// Real district rasters (skipped when absent)
// ============================================================================

#[test]
fn test_real_ndvi_raster() {
    let path = require_test_file!("NDVI_AdoOdoOta_Sep2025.tif");
    let bytes = std::fs::read(path).unwrap();
    let raster = decode(&bytes).unwrap();
    assert!(raster.bounds().is_valid());
    assert!(raster.band_count() >= 1);
}
