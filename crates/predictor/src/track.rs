use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One line of predictor output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// POSIX seconds.
    pub timestamp: i64,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl TrackPoint {
    /// Parse `timestamp,lat,lon,alt`; anything else is `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',').map(str::trim);
        let timestamp = fields.next()?.parse().ok()?;
        let lat = fields.next()?.parse().ok()?;
        let lon = fields.next()?.parse().ok()?;
        let alt = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            timestamp,
            lat,
            lon,
            alt,
        })
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }
}

/// A predicted flight path, in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub points: Vec<TrackPoint>,
}

impl Track {
    /// Collect the parseable lines of predictor stdout.
    pub fn parse(output: &str) -> Self {
        Self {
            points: output.lines().filter_map(TrackPoint::parse).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn launch(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn landing(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    /// Highest point of the flight.
    pub fn burst(&self) -> Option<&TrackPoint> {
        self.points
            .iter()
            .max_by(|a, b| a.alt.total_cmp(&b.alt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_noise() {
        let output = "\
1518998400,-34.9499,138.5194,0.0
Loading wind data...
1518999000,-34.9,138.6,26000.0
1519000000.5,-34.8,138.9,0.0
1519000000,-34.8,138.9
1519000600,-34.8,138.9,100.0,extra

1519001200,-34.7,139.1,12.5
";
        let track = Track::parse(output);
        assert_eq!(track.len(), 3);
        assert_eq!(track.launch().unwrap().timestamp, 1_518_998_400);
        assert_eq!(track.burst().unwrap().alt, 26000.0);
        assert_eq!(track.landing().unwrap().lon, 139.1);
    }

    #[test]
    fn test_empty_track() {
        let track = Track::parse("");
        assert!(track.is_empty());
        assert!(track.landing().is_none());
    }
}
