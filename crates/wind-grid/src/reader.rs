//! Grid file reader, the consumer-side counterpart of [`crate::writer`].

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};

use gfs_common::{GfsError, GfsResult};

const HEADER_MARKER: &str = "window centre latitude, window latitude radius";

/// Degrees per radian, to the precision the integrator uses.
const DEGREES_PER_RADIAN: f64 = 57.29578;

/// Window and valid time from the first data line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    pub lat_centre: f64,
    pub lat_radius: f64,
    pub lon_centre: f64,
    pub lon_radius: f64,
    pub valid_time: i64,
}

/// A parsed grid file.
///
/// `data` is flattened `[pressure][lat][lon]` in write order; each point
/// holds `[hgt, u, v, speed, direction]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFile {
    pub header: GridHeader,
    pub pressures: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub data: Vec<[f64; 5]>,
}

impl GridFile {
    pub fn read(path: &Path) -> GfsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> GfsResult<Self> {
        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default();
        if !first.contains(HEADER_MARKER) {
            return Err(GfsError::format("missing window header line"));
        }

        let mut lines = lines.map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#'));
        let mut next_line = |what: &str| {
            lines
                .next()
                .ok_or_else(|| GfsError::format(format!("unexpected end of file reading {}", what)))
        };

        let header = parse_header(next_line("header")?)?;

        let axes = parse_count(next_line("axis count")?, "axis count")?;
        if axes != 3 {
            return Err(GfsError::format(format!("expected 3 axes, found {}", axes)));
        }

        let pressures = parse_axis(&mut next_line, "pressures")?;
        let latitudes = parse_axis(&mut next_line, "latitudes")?;
        let longitudes = parse_axis(&mut next_line, "longitudes")?;

        let expected = pressures.len() * latitudes.len() * longitudes.len();
        let declared = parse_count(next_line("data line count")?, "data line count")?;
        if declared != expected {
            return Err(GfsError::format(format!(
                "declared {} data lines but axes give {}",
                declared, expected
            )));
        }

        let components = parse_count(next_line("component count")?, "component count")?;
        if components != 3 {
            return Err(GfsError::format(format!(
                "expected 3 components per line, found {}",
                components
            )));
        }

        let data: Vec<[f64; 5]> = lines.filter_map(parse_row).collect();
        if data.len() != declared {
            return Err(GfsError::format(format!(
                "declared {} data lines, found {}",
                declared,
                data.len()
            )));
        }

        Ok(Self {
            header,
            pressures,
            latitudes,
            longitudes,
            data,
        })
    }

    /// Axis lengths as (pressures, latitudes, longitudes).
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.pressures.len(), self.latitudes.len(), self.longitudes.len())
    }

    pub fn point(&self, pressure: usize, lat: usize, lon: usize) -> &[f64; 5] {
        let (_, nlat, nlon) = self.shape();
        &self.data[(pressure * nlat + lat) * nlon + lon]
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.header.valid_time, 0).single()
    }
}

fn parse_header(line: &str) -> GfsResult<GridHeader> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return Err(GfsError::format(format!(
            "header line has {} fields, expected 5",
            fields.len()
        )));
    }
    let num = |i: usize| {
        fields[i]
            .parse::<f64>()
            .map_err(|_| GfsError::format(format!("bad header value '{}'", fields[i])))
    };
    let valid_time = fields[4]
        .parse::<i64>()
        .map_err(|_| GfsError::format(format!("bad timestamp '{}'", fields[4])))?;

    Ok(GridHeader {
        lat_centre: num(0)?,
        lat_radius: num(1)?,
        lon_centre: num(2)?,
        lon_radius: num(3)?,
        valid_time,
    })
}

fn parse_count(line: &str, what: &str) -> GfsResult<usize> {
    line.parse::<usize>()
        .map_err(|_| GfsError::format(format!("bad {} '{}'", what, line)))
}

fn parse_axis<'a, F>(next_line: &mut F, name: &str) -> GfsResult<Vec<f64>>
where
    F: FnMut(&str) -> GfsResult<&'a str>,
{
    let count = parse_count(next_line(name)?, name)?;
    let values = next_line(name)?
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| GfsError::format(format!("bad {} value '{}'", name, v)))
        })
        .collect::<GfsResult<Vec<_>>>()?;
    if values.len() != count {
        return Err(GfsError::format(format!(
            "{} axis declares {} values, found {}",
            name,
            count,
            values.len()
        )));
    }
    Ok(values)
}

/// A data row, expanded with speed and direction. Anything that is not
/// exactly three numbers is ignored.
fn parse_row(line: &str) -> Option<[f64; 5]> {
    let mut fields = line.split(',');
    let hgt = fields.next()?.trim().parse::<f64>().ok()?;
    let u = fields.next()?.trim().parse::<f64>().ok()?;
    let v = fields.next()?.trim().parse::<f64>().ok()?;
    if fields.next().is_some() {
        return None;
    }

    let speed = (u * u + v * v).sqrt();
    let direction = DEGREES_PER_RADIAN * u.atan2(v) + 180.0;
    Some([hgt, u, v, speed, direction])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
# window centre latitude, window latitude radius, window centre longitude, window longitude radius, POSIX timestamp
-34.0,0.5,139.0,0.5,1518998400
# Number of axes
3
# axis 1: pressures
1
500.0
# axis 2: latitudes
1
-34.0
# axis 3: longitudes
2
138.0,139.0
# number of lines of data
2
# data line component count
3
# now the data in axis 3 major order
# data is: geopotential height [gpm], u-component wind [m/s], v-component wind [m/s]
5500.00000,3.00000,4.00000
5510.00000,0.00000,-2.00000
";

    #[test]
    fn test_parse_small_file() {
        let grid = GridFile::parse(SMALL).unwrap();
        assert_eq!(grid.shape(), (1, 1, 2));
        assert_eq!(grid.header.valid_time, 1_518_998_400);
        assert_eq!(
            grid.timestamp(),
            Some(Utc.with_ymd_and_hms(2018, 2, 19, 0, 0, 0).unwrap())
        );
        assert_eq!(grid.longitudes, vec![138.0, 139.0]);

        let p = grid.point(0, 0, 0);
        assert_eq!(p[0], 5500.0);
        assert!((p[3] - 5.0).abs() < 1e-9);
        // Wind from the south-west blows north-east: direction is where it comes from
        assert!((p[4] - (57.29578 * 3f64.atan2(4.0) + 180.0)).abs() < 1e-9);

        let q = grid.point(0, 0, 1);
        assert!((q[3] - 2.0).abs() < 1e-9);
        assert!((q[4] - (57.29578 * std::f64::consts::PI + 180.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_header_rejected() {
        let text = SMALL.replacen("window centre latitude, window latitude radius", "something", 1);
        assert!(matches!(GridFile::parse(&text), Err(GfsError::FormatError(_))));
    }

    #[test]
    fn test_axis_count_mismatch_rejected() {
        let text = SMALL.replace("2\n138.0,139.0", "3\n138.0,139.0");
        assert!(matches!(GridFile::parse(&text), Err(GfsError::FormatError(_))));
    }

    #[test]
    fn test_component_count_must_be_three() {
        let text = SMALL.replace("# data line component count\n3", "# data line component count\n4");
        assert!(matches!(GridFile::parse(&text), Err(GfsError::FormatError(_))));
    }

    #[test]
    fn test_malformed_rows_ignored_but_counted() {
        let text = SMALL.replace("5510.00000,0.00000,-2.00000\n", "1,2\n");
        assert!(matches!(GridFile::parse(&text), Err(GfsError::FormatError(_))));

        let text = format!("{}junk line\n", SMALL);
        assert!(GridFile::parse(&text).is_ok());
    }
}
