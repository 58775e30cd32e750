//! Ready-made rasters shaped like the Ado-Odo/Ota district exports.

use crate::generators::{create_ndvi_grid, create_rainfall_grid, with_nodata_border};
use crate::geotiff::GeoTiffFixture;

/// Extent used by the district fixtures, as `(min_lng, min_lat, max_lng, max_lat)`.
pub const ADO_ODO_OTA_BBOX: (f64, f64, f64, f64) = (2.70, 6.40, 3.10, 6.90);

/// Fixture raster size and resolution.
pub const FIXTURE_WIDTH: u32 = 40;
pub const FIXTURE_HEIGHT: u32 = 50;
pub const FIXTURE_PIXEL_DEG: f64 = 0.01;

pub const FIXTURE_NODATA: f64 = -9999.0;

/// A point well inside the district extent, `(lat, lng)`.
pub const INSIDE_POINT: (f64, f64) = (6.65, 2.905);

/// A point far outside it, `(lat, lng)`.
pub const OUTSIDE_POINT: (f64, f64) = (9.0, 5.0);

fn district(values: Vec<f32>) -> GeoTiffFixture {
    let (min_lng, _, _, max_lat) = ADO_ODO_OTA_BBOX;
    GeoTiffFixture::new(FIXTURE_WIDTH, FIXTURE_HEIGHT, values)
        .origin(min_lng, max_lat)
        .pixel_size(FIXTURE_PIXEL_DEG, FIXTURE_PIXEL_DEG)
        .nodata(FIXTURE_NODATA)
}

/// NDVI column ramp with a no-data border.
pub fn ndvi_fixture() -> GeoTiffFixture {
    let (w, h) = (FIXTURE_WIDTH as usize, FIXTURE_HEIGHT as usize);
    district(with_nodata_border(create_ndvi_grid(w, h), w, h, FIXTURE_NODATA as f32))
}

/// Rainfall anomaly row ramp with a no-data border.
pub fn rainfall_fixture() -> GeoTiffFixture {
    let (w, h) = (FIXTURE_WIDTH as usize, FIXTURE_HEIGHT as usize);
    district(with_nodata_border(
        create_rainfall_grid(w, h),
        w,
        h,
        FIXTURE_NODATA as f32,
    ))
}

/// Encoded NDVI fixture.
pub fn ndvi_geotiff() -> Vec<u8> {
    ndvi_fixture().encode().expect("NDVI fixture encodes")
}

/// Encoded rainfall fixture.
pub fn rainfall_geotiff() -> Vec<u8> {
    rainfall_fixture().encode().expect("rainfall fixture encodes")
}
