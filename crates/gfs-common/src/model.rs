//! Supported GFS products and their forecast-hour tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GfsError;

/// Isobaric levels (hPa) requested from the upstream filter.
pub const GFS_LEVELS: &[u32] = &[
    1000, 975, 950, 925, 900, 850, 800, 750, 700, 650, 600, 550, 500, 450, 400, 350, 300, 250,
    200, 150, 100, 70, 50, 30, 20, 10, 7, 5, 3, 2, 1,
];

/// GRIB2 short names of the fields a grid file carries.
pub const GFS_PARAMS: &[&str] = &["HGT", "UGRD", "VGRD"];

/// Default filter endpoint; `{model}` is replaced with the model name.
pub const DEFAULT_FILTER_URL: &str = "http://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_{model}.pl";

/// A GFS product served by the NOMADS grib filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastModel {
    /// 0.25 degree, hourly out to 120 h.
    #[serde(rename = "0p25_1hr")]
    Gfs0p25Hourly,
    /// 0.5 degree, 3-hourly out to 240 h.
    #[serde(rename = "0p50")]
    Gfs0p50,
}

impl ForecastModel {
    pub fn all() -> &'static [ForecastModel] {
        &[ForecastModel::Gfs0p25Hourly, ForecastModel::Gfs0p50]
    }

    /// Name used in the filter script path.
    pub fn name(&self) -> &'static str {
        match self {
            ForecastModel::Gfs0p25Hourly => "0p25_1hr",
            ForecastModel::Gfs0p50 => "0p50",
        }
    }

    /// Resolution token used inside upstream file names.
    pub fn resolution(&self) -> &'static str {
        self.name().split('_').next().unwrap_or_else(|| self.name())
    }

    /// Upstream file name for a run cycle and forecast hour.
    pub fn file_name(&self, cycle: &str, forecast_hour: u32) -> String {
        match self {
            ForecastModel::Gfs0p25Hourly => format!(
                "gfs.t{}z.pgrb2.{}.f{:03}",
                cycle,
                self.resolution(),
                forecast_hour
            ),
            ForecastModel::Gfs0p50 => format!(
                "gfs.t{}z.pgrb2full.{}.f{:03}",
                cycle,
                self.resolution(),
                forecast_hour
            ),
        }
    }

    /// Filter script URL built from a `{model}` template.
    pub fn filter_url(&self, template: &str) -> String {
        template.replace("{model}", self.name())
    }

    /// Ascending list of forecast offsets (hours) this product publishes.
    pub fn offsets(&self) -> Vec<u32> {
        match self {
            ForecastModel::Gfs0p25Hourly => (0..120)
                .chain((120..240).step_by(3))
                .chain((240..396).step_by(12))
                .collect(),
            ForecastModel::Gfs0p50 => (0..240).step_by(3).chain((240..396).step_by(12)).collect(),
        }
    }

    /// Index of the table entry closest to `requested`.
    ///
    /// Ties resolve to the lower entry; requests past the end land on the last entry.
    pub fn nearest_index(&self, requested: u32) -> usize {
        let offsets = self.offsets();
        let mut best = 0;
        for (idx, offset) in offsets.iter().enumerate() {
            if offset.abs_diff(requested) < offsets[best].abs_diff(requested) {
                best = idx;
            }
        }
        best
    }

    /// Table entry closest to `requested`.
    pub fn nearest_offset(&self, requested: u32) -> u32 {
        self.offsets()[self.nearest_index(requested)]
    }

    /// All offsets from 0 up to and including `nearest_offset(requested)`.
    pub fn offsets_through(&self, requested: u32) -> Vec<u32> {
        let mut offsets = self.offsets();
        offsets.truncate(self.nearest_index(requested) + 1);
        offsets
    }
}

impl fmt::Display for ForecastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForecastModel {
    type Err = GfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForecastModel::all()
            .iter()
            .copied()
            .find(|model| model.name() == s)
            .ok_or_else(|| GfsError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shapes() {
        let hourly = ForecastModel::Gfs0p25Hourly.offsets();
        assert_eq!(hourly.len(), 120 + 40 + 13);
        assert_eq!(hourly[119], 119);
        assert_eq!(hourly[120], 120);
        assert_eq!(*hourly.last().unwrap(), 384);

        let half = ForecastModel::Gfs0p50.offsets();
        assert_eq!(half.len(), 80 + 13);
        assert_eq!(&half[..4], &[0, 3, 6, 9]);
        assert!(half.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_nearest_offset_members_are_fixed_points() {
        for model in ForecastModel::all() {
            for offset in model.offsets() {
                assert_eq!(model.nearest_offset(offset), offset);
            }
        }
    }

    #[test]
    fn test_nearest_offset_ties_go_low() {
        assert_eq!(ForecastModel::Gfs0p25Hourly.nearest_offset(121), 120);
        assert_eq!(ForecastModel::Gfs0p25Hourly.nearest_offset(122), 123);
        // 246 is equidistant from 240 and 252
        assert_eq!(ForecastModel::Gfs0p25Hourly.nearest_offset(246), 240);
        assert_eq!(ForecastModel::Gfs0p50.nearest_offset(4), 3);
        assert_eq!(ForecastModel::Gfs0p50.nearest_offset(5), 6);
    }

    #[test]
    fn test_nearest_offset_beyond_range() {
        assert_eq!(ForecastModel::Gfs0p25Hourly.nearest_offset(1000), 384);
        assert_eq!(ForecastModel::Gfs0p50.nearest_offset(u32::MAX), 384);
    }

    #[test]
    fn test_offsets_through() {
        assert_eq!(ForecastModel::Gfs0p50.offsets_through(10), vec![0, 3, 6, 9]);
        assert_eq!(ForecastModel::Gfs0p25Hourly.offsets_through(0), vec![0]);
        assert_eq!(ForecastModel::Gfs0p25Hourly.offsets_through(48).len(), 49);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            ForecastModel::Gfs0p25Hourly.file_name("06", 3),
            "gfs.t06z.pgrb2.0p25.f003"
        );
        assert_eq!(
            ForecastModel::Gfs0p50.file_name("18", 120),
            "gfs.t18z.pgrb2full.0p50.f120"
        );
        assert_eq!(
            ForecastModel::Gfs0p50.filter_url(DEFAULT_FILTER_URL),
            "http://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_0p50.pl"
        );
    }

    #[test]
    fn test_parse_model() {
        assert_eq!("0p25_1hr".parse::<ForecastModel>().unwrap(), ForecastModel::Gfs0p25Hourly);
        assert!(matches!("0p75".parse::<ForecastModel>(), Err(GfsError::UnknownModel(_))));
    }

    #[test]
    fn test_model_yaml_names() {
        let model: ForecastModel = serde_yaml::from_str("0p50").unwrap();
        assert_eq!(model, ForecastModel::Gfs0p50);
        let model: ForecastModel = serde_yaml::from_str("\"0p25_1hr\"").unwrap();
        assert_eq!(model, ForecastModel::Gfs0p25Hourly);
    }
}
