//! Request windows and the clamped whole-degree boxes sent upstream.

use serde::{Deserialize, Serialize};

/// A rectangular request window described by its centre and half-widths in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub lat: f64,
    pub lon: f64,
    pub lat_delta: f64,
    pub lon_delta: f64,
}

impl Window {
    pub fn new(lat: f64, lon: f64, lat_delta: f64, lon_delta: f64) -> Self {
        Self {
            lat,
            lon,
            lat_delta,
            lon_delta,
        }
    }

    /// The 1°×1° window at the origin used to test whether a run is online.
    pub fn probe() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Box edges truncated to whole degrees and clamped to the valid ranges.
    pub fn filter_box(&self) -> FilterBox {
        FilterBox {
            left_lon: ((self.lon - self.lon_delta) as i32).max(-180),
            right_lon: ((self.lon + self.lon_delta) as i32).min(180),
            top_lat: ((self.lat + self.lat_delta) as i32).min(90),
            bottom_lat: ((self.lat - self.lat_delta) as i32).max(-90),
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(-34.0, 138.0, 10.0, 10.0)
    }
}

/// Whole-degree bounding box in the form the grib filter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterBox {
    pub left_lon: i32,
    pub right_lon: i32,
    pub top_lat: i32,
    pub bottom_lat: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_box_truncates_toward_zero() {
        let fb = Window::new(-33.7, 138.6, 10.0, 10.0).filter_box();
        assert_eq!(fb.left_lon, 128);
        assert_eq!(fb.right_lon, 148);
        assert_eq!(fb.top_lat, -23);
        assert_eq!(fb.bottom_lat, -43);
    }

    #[test]
    fn test_filter_box_clamps() {
        let fb = Window::new(85.0, 175.0, 10.0, 10.0).filter_box();
        assert_eq!(fb.top_lat, 90);
        assert_eq!(fb.right_lon, 180);

        let fb = Window::new(-85.0, -175.0, 10.0, 10.0).filter_box();
        assert_eq!(fb.bottom_lat, -90);
        assert_eq!(fb.left_lon, -180);
    }

    #[test]
    fn test_probe_window() {
        let fb = Window::probe().filter_box();
        assert_eq!(fb, FilterBox { left_lon: -1, right_lon: 1, top_lat: 1, bottom_lat: -1 });
    }
}
