//! Model run clock and run labels.
//!
//! GFS is issued every 6 hours at 00, 06, 12 and 18 UTC. A run is identified
//! by its issue time; on disk it is labelled `YYYYMMDDHHz`.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GfsError, GfsResult};
use crate::model::ForecastModel;

/// Hours between consecutive model runs.
pub const RUN_INTERVAL_HOURS: i64 = 6;

/// strftime pattern of a run label, e.g. `2024011512z`.
pub const LABEL_FORMAT: &str = "%Y%m%d%Hz";

/// Issue time of the `age`-th most recent model run at or before `now`.
///
/// `age = 0` is the newest run, `age = 1` the one before it, and so on.
pub fn latest_run(now: DateTime<Utc>, age: u32) -> DateTime<Utc> {
    let hour = now.hour() - now.hour() % RUN_INTERVAL_HOURS as u32;
    let floored = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(now);

    floored - Duration::hours(RUN_INTERVAL_HOURS * age as i64)
}

/// Identity of one forecast model issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRun {
    pub model: ForecastModel,
    pub issue_time: DateTime<Utc>,
}

impl ModelRun {
    pub fn new(model: ForecastModel, issue_time: DateTime<Utc>) -> Self {
        Self { model, issue_time }
    }

    /// The `age`-th most recent run of `model` relative to `now`.
    pub fn latest(model: ForecastModel, now: DateTime<Utc>, age: u32) -> Self {
        Self::new(model, latest_run(now, age))
    }

    /// Dataset label, e.g. `2024011512z`.
    pub fn label(&self) -> String {
        self.issue_time.format(LABEL_FORMAT).to_string()
    }

    /// Two-digit cycle hour used in upstream file names.
    pub fn cycle(&self) -> String {
        self.issue_time.format("%H").to_string()
    }

    /// Upstream directory for this run, e.g. `/gfs.2024011512`.
    pub fn directory(&self) -> String {
        format!("/gfs.{}", self.issue_time.format("%Y%m%d%H"))
    }

    /// Valid time of a forecast offset from this run.
    pub fn valid_time(&self, forecast_hour: u32) -> DateTime<Utc> {
        self.issue_time + Duration::hours(forecast_hour as i64)
    }
}

impl fmt::Display for ModelRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.model, self.label())
    }
}

/// Parse a run label (`YYYYMMDDHHz`) back into an issue time.
pub fn parse_label(label: &str) -> GfsResult<DateTime<Utc>> {
    let trimmed = label.trim();
    let digits = trimmed.strip_suffix('z').unwrap_or(trimmed);

    NaiveDateTime::parse_from_str(&format!("{}00", digits), "%Y%m%d%H%M")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| GfsError::format(format!("invalid dataset label '{}': {}", trimmed, e)))
}
