//! Test support for the raster-overlay workspace.
//!
//! - [`GeoTiffFixture`] writes small Float32 GeoTIFFs in memory.
//! - `generators` builds NDVI and rainfall-anomaly ramps.
//! - `fixtures` wraps them in the Ado-Odo/Ota extent with a no-data border,
//!   together with reference points inside and outside it.
//! - `require_test_file!` skips tests whose real raster is absent.
//!
//! Add it as a dev-dependency: `test-utils = { path = "../test-utils" }`.

pub mod fixtures;
pub mod generators;
pub mod geotiff;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use geotiff::{GeoTiffFixture, Georeference};
pub use paths::{find_test_file, search_dirs, workspace_root, TEST_DATA_ENV};

/// Resolve a real raster by file name or return from the test.
///
/// ```ignore
/// let path = test_utils::require_test_file!("NDVI_AdoOdoOta_Sep2025.tif");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        let Some(path) = $crate::find_test_file($name) else {
            eprintln!(
                "skipping: {} not found in {:?} (set {} to add a directory)",
                $name,
                $crate::search_dirs(),
                $crate::TEST_DATA_ENV
            );
            return;
        };
        path
    }};
}

/// `|left - right| <= epsilon`, compared as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (left - right).abs() <= epsilon,
            "{} is not within {} of {}",
            left,
            epsilon,
            right
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_within_epsilon() {
        assert_approx_eq!(0.2501, 0.25, 0.001);
        assert_approx_eq!(-50.0_f32, -50.000001, 1e-4);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_approx_eq_outside_epsilon() {
        assert_approx_eq!(0.26, 0.25, 0.001);
    }

    #[test]
    fn test_district_fixtures_encode() {
        assert!(!crate::ndvi_geotiff().is_empty());
        assert!(!crate::rainfall_geotiff().is_empty());
    }
}
