//! Generators for synthetic, exactly representable wind and height fields.
//!
//! Values are multiples of 0.25 so they survive 16-bit simple packing and
//! five-decimal text formatting without rounding error.

/// Geopotential height field: `base + 10 * row + col`, in gpm.
///
/// Returns a `Vec<f32>` in row-major order (row 0 first).
pub fn create_height_grid(width: usize, height: usize, base: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(base + (10 * row + col) as f32);
        }
    }
    data
}

/// U-component wind that increases eastward in quarter m/s steps.
pub fn create_u_wind_grid(width: usize, height: usize, base: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(base + col as f32 * 0.25 - row as f32 * 0.5);
        }
    }
    data
}

/// V-component wind that increases northward in half m/s steps.
pub fn create_v_wind_grid(width: usize, height: usize, base: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(base - row as f32 * 0.5 + col as f32 * 0.75);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_grid_layout() {
        let grid = create_height_grid(3, 2, 100.0);
        assert_eq!(grid, vec![100.0, 101.0, 102.0, 110.0, 111.0, 112.0]);
    }

    #[test]
    fn test_wind_grids_are_quarter_steps() {
        for v in create_u_wind_grid(4, 4, -3.0)
            .into_iter()
            .chain(create_v_wind_grid(4, 4, 2.5))
        {
            assert_eq!((v * 4.0).fract(), 0.0);
        }
    }
}
