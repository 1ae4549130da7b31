//! North-up affine geotransform of a latitude/longitude grid.
//!
//! The transform describes the outer edge of the top-left pixel, so pixel
//! centres sit half a pixel in from the origin. Rows run north to south and
//! columns west to east whatever order the payload was scanned in;
//! [`GeoTransform::reorient`] brings field values into that order.

use grib2_parser::GridDefinition;

use gfs_common::{GfsError, GfsResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    /// Negative: latitude decreases with row index.
    pub pixel_height: f64,
    pub x_size: usize,
    pub y_size: usize,
    northward: bool,
    westward: bool,
}

impl GeoTransform {
    pub fn from_grid(grid: &GridDefinition) -> GfsResult<Self> {
        if grid.scanning_mode & 0x20 != 0 {
            return Err(GfsError::Decode(
                "column-major (j consecutive) grids are not supported".to_string(),
            ));
        }

        let x_size = grid.num_points_longitude as usize;
        let y_size = grid.num_points_latitude as usize;
        let dx = grid.longitude_increment;
        let dy = grid.latitude_increment;
        if x_size == 0 || y_size == 0 || dx <= 0.0 || dy <= 0.0 {
            return Err(GfsError::Decode(format!(
                "degenerate grid {}x{} with increments {}/{}",
                x_size, y_size, dx, dy
            )));
        }

        let west = if grid.scans_westward() {
            grid.first_longitude - (x_size - 1) as f64 * dx
        } else {
            grid.first_longitude
        };
        let north = if grid.scans_northward() {
            grid.first_latitude + (y_size - 1) as f64 * dy
        } else {
            grid.first_latitude
        };
        let west = if west > 180.0 { west - 360.0 } else { west };

        Ok(Self {
            origin_x: west - dx / 2.0,
            pixel_width: dx,
            origin_y: north + dy / 2.0,
            pixel_height: -dy,
            x_size,
            y_size,
            northward: grid.scans_northward(),
            westward: grid.scans_westward(),
        })
    }

    /// Longitude of each column centre, west to east.
    pub fn lon_scale(&self) -> Vec<f64> {
        let first = self.origin_x + self.pixel_width / 2.0;
        (0..self.x_size)
            .map(|i| first + i as f64 * self.pixel_width)
            .collect()
    }

    /// Latitude of each row centre, north to south.
    pub fn lat_scale(&self) -> Vec<f64> {
        let first = self.origin_y + self.pixel_height / 2.0;
        (0..self.y_size)
            .map(|j| first + j as f64 * self.pixel_height)
            .collect()
    }

    /// Reorder scan-order values into north-up, west-first row-major order.
    pub fn reorient(&self, values: Vec<f32>) -> Vec<f32> {
        if !self.northward && !self.westward {
            return values;
        }

        let mut out = Vec::with_capacity(values.len());
        for row in 0..self.y_size {
            let src_row = if self.northward { self.y_size - 1 - row } else { row };
            for col in 0..self.x_size {
                let src_col = if self.westward { self.x_size - 1 - col } else { col };
                out.push(values[src_row * self.x_size + src_col]);
            }
        }
        out
    }

    /// Same grid size and spacing as `other`.
    pub fn matches(&self, other: &GeoTransform) -> bool {
        self.x_size == other.x_size
            && self.y_size == other.y_size
            && (self.origin_x - other.origin_x).abs() < 1e-6
            && (self.origin_y - other.origin_y).abs() < 1e-6
            && (self.pixel_width - other.pixel_width).abs() < 1e-9
            && (self.pixel_height - other.pixel_height).abs() < 1e-9
    }
}
