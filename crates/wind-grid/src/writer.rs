//! Grid file serialization.
//!
//! The text layout is consumed by the trajectory integrator, so the output
//! must stay byte-for-byte stable: fixed header comments, one decimal on
//! axis values and five on data values.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use gfs_common::GfsResult;

use crate::raster::DecodedRaster;

/// File name keyed on valid time and window.
pub fn grid_file_name(raster: &DecodedRaster) -> String {
    format!(
        "gfs_{}_{:.1}_{:.1}_{:.1}_{:.1}.dat",
        raster.valid_time, raster.lat_centre, raster.lon_centre, raster.lat_radius, raster.lon_radius
    )
}

/// Render the full file contents.
pub fn render(raster: &DecodedRaster) -> String {
    let pressures = raster.pressures_descending();
    let lat_count = raster.lat_scale.len();
    let lon_count = raster.lon_scale.len();

    let mut out = String::new();
    out.push_str("# window centre latitude, window latitude radius, window centre longitude, window longitude radius, POSIX timestamp\n");
    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{:.1},{:.1},{:.1},{:.1},{}",
        raster.lat_centre, raster.lat_radius, raster.lon_centre, raster.lon_radius, raster.valid_time
    );
    out.push_str("# Number of axes\n3\n");

    out.push_str("# axis 1: pressures\n");
    push_axis(&mut out, pressures.iter().map(|&p| p as f64));
    out.push_str("# axis 2: latitudes\n");
    push_axis(&mut out, raster.lat_scale.iter().copied());
    out.push_str("# axis 3: longitudes\n");
    push_axis(&mut out, raster.lon_scale.iter().copied());

    out.push_str("# number of lines of data\n");
    let _ = writeln!(out, "{}", pressures.len() * lat_count * lon_count);
    out.push_str("# data line component count\n3\n");
    out.push_str("# now the data in axis 3 major order\n");
    out.push_str("# data is: geopotential height [gpm], u-component wind [m/s], v-component wind [m/s]\n");

    for pressure in &pressures {
        let fields = &raster.levels[pressure];
        for lat in 0..lat_count {
            for lon in 0..lon_count {
                let _ = writeln!(
                    out,
                    "{:.5},{:.5},{:.5}",
                    fields.hgt.get(lat, lon),
                    fields.ugrd.get(lat, lon),
                    fields.vgrd.get(lat, lon)
                );
            }
        }
    }

    out
}

fn push_axis(out: &mut String, values: impl ExactSizeIterator<Item = f64>) {
    let _ = writeln!(out, "{}", values.len());
    let joined: Vec<String> = values.map(|v| format!("{:.1}", v)).collect();
    out.push_str(&joined.join(","));
    out.push('\n');
}

/// Write the raster into `output_dir` and return the file path.
#[instrument(skip(raster), fields(valid_time = raster.valid_time))]
pub fn serialize(raster: &DecodedRaster, output_dir: &Path) -> GfsResult<PathBuf> {
    let path = output_dir.join(grid_file_name(raster));
    let text = render(raster);
    std::fs::write(&path, text.as_bytes())?;
    debug!(path = %path.display(), bytes = text.len(), "Wrote grid file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::raster::{Field2D, LevelFields};

    fn single_point_raster() -> DecodedRaster {
        let field = |v: f32| Field2D::new(1, 1, vec![v]).unwrap();
        let mut levels = BTreeMap::new();
        levels.insert(
            500,
            LevelFields {
                hgt: field(5500.0),
                ugrd: field(-3.25),
                vgrd: field(1.5),
            },
        );
        DecodedRaster::new(vec![-34.0], vec![138.5], levels, 1_518_998_400).unwrap()
    }

    #[test]
    fn test_single_point_text() {
        let expected = "\
# window centre latitude, window latitude radius, window centre longitude, window longitude radius, POSIX timestamp
-34.0,0.0,138.5,0.0,1518998400
# Number of axes
3
# axis 1: pressures
1
500.0
# axis 2: latitudes
1
-34.0
# axis 3: longitudes
1
138.5
# number of lines of data
1
# data line component count
3
# now the data in axis 3 major order
# data is: geopotential height [gpm], u-component wind [m/s], v-component wind [m/s]
5500.00000,-3.25000,1.50000
";
        assert_eq!(render(&single_point_raster()), expected);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            grid_file_name(&single_point_raster()),
            "gfs_1518998400_-34.0_138.5_0.0_0.0.dat"
        );
    }
}
