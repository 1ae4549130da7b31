use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Launch parameters for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub launch_lat: f64,
    pub launch_lon: f64,
    /// Metres above sea level.
    pub launch_alt: f64,
    /// m/s
    pub ascent_rate: f64,
    /// m/s at sea level
    pub descent_rate: f64,
    pub burst_alt: f64,
    pub launch_time: DateTime<Utc>,
    /// Payload is already descending from `launch_alt`; ascent and burst are ignored.
    pub descent_mode: bool,
}

impl Scenario {
    pub fn new(launch_lat: f64, launch_lon: f64, launch_time: DateTime<Utc>) -> Self {
        Self {
            launch_lat,
            launch_lon,
            launch_time,
            ..Self::default()
        }
    }

    /// The INI-like text the predictor reads on stdin.
    pub fn render(&self) -> String {
        let burst_alt = if self.descent_mode {
            self.launch_alt
        } else {
            self.burst_alt
        };
        let t = &self.launch_time;

        let mut s = String::new();
        // Writing to a String cannot fail
        let _ = write!(
            s,
            "[launch-site]\n\
             latitude = {:.5}\n\
             longitude = {:.5}\n\
             altitude = {}\n\
             [atmosphere]\n\
             wind-error = 0\n\
             [altitude-model]\n\
             ascent-rate = {:.1}\n\
             descent-rate = {:.1}\n\
             burst-altitude = {}\n\
             [launch-time]\n\
             hour = {}\n\
             minute = {}\n\
             second = {}\n\
             day = {}\n\
             month = {}\n\
             year = {}\n",
            self.launch_lat,
            self.launch_lon,
            self.launch_alt as i64,
            self.ascent_rate,
            self.descent_rate,
            burst_alt as i64,
            t.hour(),
            t.minute(),
            t.second(),
            t.day(),
            t.month(),
            t.year(),
        );
        s
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            launch_lat: -34.9499,
            launch_lon: 138.5194,
            launch_alt: 0.0,
            ascent_rate: 5.0,
            descent_rate: 8.0,
            burst_alt: 26000.0,
            launch_time: Utc::now(),
            descent_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn launch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 2, 19, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_render_ascent() {
        let scenario = Scenario {
            launch_alt: 12.7,
            burst_alt: 30000.0,
            ..Scenario::new(-34.9499, 138.5194, launch())
        };

        let expected = "\
[launch-site]
latitude = -34.94990
longitude = 138.51940
altitude = 12
[atmosphere]
wind-error = 0
[altitude-model]
ascent-rate = 5.0
descent-rate = 8.0
burst-altitude = 30000
[launch-time]
hour = 3
minute = 4
second = 5
day = 19
month = 2
year = 2018
";
        assert_eq!(scenario.render(), expected);
    }

    #[test]
    fn test_descent_mode_bursts_at_launch_altitude() {
        let scenario = Scenario {
            launch_alt: 18500.0,
            descent_mode: true,
            ..Scenario::new(0.0, 0.0, launch())
        };
        assert!(scenario.render().contains("burst-altitude = 18500\n"));
    }
}
