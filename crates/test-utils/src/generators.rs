//! Test data generators for creating synthetic temperature fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a grid of daily maximum temperatures in Kelvin.
///
/// Values range from approximately 280K (7C) in the top-left corner to
/// 310K (37C) in the bottom-right, shifted by `day_offset` tenths of a
/// degree so consecutive days are distinguishable.
pub fn create_tmax_grid(width: usize, height: usize, day_offset: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            let temp = 280.0 + (x_factor * 15.0) + (y_factor * 15.0) + day_offset as f32 * 0.1;
            data.push(temp);
        }
    }
    data
}

/// Creates a constant-value grid.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at the given `(col, row)` positions.
///
/// Mimics sea points, which ERA5-Land leaves undefined.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    value: f32,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = create_constant_grid(width, height, value);
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}
