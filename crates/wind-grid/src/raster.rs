//! In-memory result of decoding one forecast hour.

use std::collections::BTreeMap;

use gfs_common::{GfsError, GfsResult};

/// A 2-D field stored row-major, indexed `[lat_index, lon_index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field2D {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl Field2D {
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> GfsResult<Self> {
        if values.len() != rows * cols {
            return Err(GfsError::Decode(format!(
                "field has {} values, expected {}x{}",
                values.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, values })
    }

    /// Shape as (lat_count, lon_count).
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, lat_index: usize, lon_index: usize) -> f32 {
        self.values[lat_index * self.cols + lon_index]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Height and wind components on one pressure level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFields {
    pub hgt: Field2D,
    pub ugrd: Field2D,
    pub vgrd: Field2D,
}

/// Decoded per-level fields, coordinate axes and valid time of one payload.
///
/// Every level has all three fields and every field matches
/// `(lat_scale.len(), lon_scale.len())`; [`DecodedRaster::new`] enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRaster {
    pub lon_scale: Vec<f64>,
    pub lat_scale: Vec<f64>,
    /// Keyed by pressure in hPa.
    pub levels: BTreeMap<u32, LevelFields>,
    /// POSIX seconds.
    pub valid_time: i64,
    pub lat_centre: f64,
    pub lon_centre: f64,
    pub lat_radius: f64,
    pub lon_radius: f64,
}

impl DecodedRaster {
    /// Assemble a raster, deriving the window centre and radii from the axes.
    ///
    /// The centre is the middle axis entry (index `len / 2`); each radius is
    /// half the axis span.
    pub fn new(
        lat_scale: Vec<f64>,
        lon_scale: Vec<f64>,
        levels: BTreeMap<u32, LevelFields>,
        valid_time: i64,
    ) -> GfsResult<Self> {
        if lat_scale.is_empty() || lon_scale.is_empty() {
            return Err(GfsError::Decode("raster has an empty axis".to_string()));
        }
        if levels.is_empty() {
            return Err(GfsError::EmptyDataset);
        }

        let shape = (lat_scale.len(), lon_scale.len());
        for (pressure, fields) in &levels {
            for field in [&fields.hgt, &fields.ugrd, &fields.vgrd] {
                if field.shape() != shape {
                    return Err(GfsError::Decode(format!(
                        "{} hPa field shape {:?} does not match axes {:?}",
                        pressure,
                        field.shape(),
                        shape
                    )));
                }
            }
        }

        Ok(Self {
            lat_centre: lat_scale[lat_scale.len() / 2],
            lon_centre: lon_scale[lon_scale.len() / 2],
            lat_radius: half_span(&lat_scale),
            lon_radius: half_span(&lon_scale),
            lon_scale,
            lat_scale,
            levels,
            valid_time,
        })
    }

    /// Pressure levels from highest to lowest pressure.
    pub fn pressures_descending(&self) -> Vec<u32> {
        self.levels.keys().rev().copied().collect()
    }
}

fn half_span(axis: &[f64]) -> f64 {
    let (min, max) = axis
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
    (max - min) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(rows: usize, cols: usize, v: f32) -> Field2D {
        Field2D::new(rows, cols, vec![v; rows * cols]).unwrap()
    }

    fn level(rows: usize, cols: usize) -> LevelFields {
        LevelFields {
            hgt: constant(rows, cols, 100.0),
            ugrd: constant(rows, cols, 1.0),
            vgrd: constant(rows, cols, -1.0),
        }
    }

    #[test]
    fn test_derived_window() {
        let levels = BTreeMap::from([(500, level(3, 4))]);
        let raster = DecodedRaster::new(
            vec![-33.0, -34.0, -35.0],
            vec![138.0, 138.5, 139.0, 139.5],
            levels,
            0,
        )
        .unwrap();

        assert_eq!(raster.lat_centre, -34.0);
        assert_eq!(raster.lon_centre, 139.0);
        assert_eq!(raster.lat_radius, 1.0);
        assert_eq!(raster.lon_radius, 0.75);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let levels = BTreeMap::from([(500, level(2, 2))]);
        let err = DecodedRaster::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0], levels, 0).unwrap_err();
        assert!(matches!(err, GfsError::Decode(_)));
    }

    #[test]
    fn test_no_levels_is_empty_dataset() {
        let err = DecodedRaster::new(vec![0.0], vec![0.0], BTreeMap::new(), 0).unwrap_err();
        assert!(matches!(err, GfsError::EmptyDataset));
    }

    #[test]
    fn test_pressures_descending() {
        let levels = BTreeMap::from([(500, level(1, 1)), (1000, level(1, 1)), (850, level(1, 1))]);
        let raster = DecodedRaster::new(vec![0.0], vec![0.0], levels, 0).unwrap();
        assert_eq!(raster.pressures_descending(), vec![1000, 850, 500]);
    }
}
