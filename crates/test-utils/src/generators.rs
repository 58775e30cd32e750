//! Synthetic NDVI and rainfall-anomaly grids.
//!
//! Values follow simple, predictable patterns so a test can compute the
//! expected class of any pixel from its position.

/// NDVI ramp across columns, from `-0.2` at the left edge to just under
/// `1.0` at the right edge. Every row is identical.
///
/// # Example
///
/// ```
/// use test_utils::create_ndvi_grid;
///
/// let grid = create_ndvi_grid(12, 3);
/// assert_eq!(grid.len(), 36);
/// assert!((grid[0] - -0.2).abs() < 1e-6);
/// assert_eq!(grid[0], grid[12]); // same column, next row
/// ```
pub fn create_ndvi_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let t = col as f32 / width.max(1) as f32;
            data.push(-0.2 + t * 1.2);
        }
    }
    data
}

/// Rainfall anomaly (mm) ramp down the rows, from `-80` in
/// the top row toward `+60` in the bottom row.
pub fn create_rainfall_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let t = row as f32 / height.max(1) as f32;
        let value = -80.0 + t * 140.0;
        data.extend(std::iter::repeat(value).take(width));
    }
    data
}

/// Grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Replaces the outermost ring of pixels with `nodata`, the way clipped
/// district rasters pad their bounding rectangle.
pub fn with_nodata_border(mut data: Vec<f32>, width: usize, height: usize, nodata: f32) -> Vec<f32> {
    for row in 0..height {
        for col in 0..width {
            if row == 0 || col == 0 || row + 1 == height || col + 1 == width {
                data[row * width + col] = nodata;
            }
        }
    }
    data
}
