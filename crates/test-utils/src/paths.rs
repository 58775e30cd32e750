//! Locating the published district rasters for tests that can use them.
//!
//! The real GeoTIFFs are not part of the repository. Tests that want them
//! call [`find_test_file`] (usually through `require_test_file!`) and skip
//! when nothing is found.

use std::path::{Path, PathBuf};

/// Environment variable naming an extra raster directory.
pub const TEST_DATA_ENV: &str = "TEST_DATA_DIR";

/// Two levels above this crate's manifest (`crates/test-utils`).
pub fn workspace_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// Directories searched for real rasters, most specific first:
/// `$TEST_DATA_DIR`, then `Geodata/` and `testdata/` at the workspace root.
pub fn search_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    std::env::var_os(TEST_DATA_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain([root.join("Geodata"), root.join("testdata")])
        .collect()
}

/// First existing `dir/name` over [`search_dirs`].
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    search_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}
