//! Tests for forecast requests and filter query construction.

use chrono::{TimeZone, Utc};
use gfs_common::model::DEFAULT_FILTER_URL;
use gfs_common::{ForecastModel, ForecastRequest, ModelRun, Window, GFS_LEVELS, GFS_PARAMS};

fn params() -> Vec<String> {
    GFS_PARAMS.iter().map(|p| p.to_string()).collect()
}

fn run() -> ModelRun {
    ModelRun::new(
        ForecastModel::Gfs0p25Hourly,
        Utc.with_ymd_and_hms(2018, 2, 19, 0, 0, 0).unwrap(),
    )
}

// ============================================================================
// Filter query tests
// ============================================================================

#[test]
fn test_filter_query_matches_upstream_form() {
    let request = ForecastRequest::new(run(), 6, Window::new(-34.0, 138.0, 10.0, 10.0));
    let query = request.filter_query(DEFAULT_FILTER_URL, &params(), GFS_LEVELS);

    assert_eq!(query.url, "http://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_0p25_1hr.pl");
    assert_eq!(query.get("file"), Some("gfs.t00z.pgrb2.0p25.f006"));
    assert_eq!(query.get("dir"), Some("/gfs.2018021900"));
    assert_eq!(query.get("subregion"), Some(""));
    assert_eq!(query.get("leftlon"), Some("128"));
    assert_eq!(query.get("rightlon"), Some("148"));
    assert_eq!(query.get("toplat"), Some("-24"));
    assert_eq!(query.get("bottomlat"), Some("-44"));
    assert_eq!(query.get("var_HGT"), Some("on"));
    assert_eq!(query.get("var_VGRD"), Some("on"));
    assert_eq!(query.get("lev_1000_mb"), Some("on"));
    assert_eq!(query.get("lev_1_mb"), Some("on"));
    assert_eq!(query.params.len(), 7 + GFS_PARAMS.len() + GFS_LEVELS.len());
}

#[test]
fn test_request_snaps_forecast_hour() {
    let run = ModelRun::new(ForecastModel::Gfs0p50, run().issue_time);
    let request = ForecastRequest::new(run, 7, Window::default());
    assert_eq!(request.forecast_hour, 6);
    assert_eq!(request.file_name(), "gfs.t00z.pgrb2full.0p50.f006");
}

#[test]
fn test_probe_request_uses_origin_window() {
    let request = ForecastRequest::probe(run(), 48);
    let query = request.filter_query(DEFAULT_FILTER_URL, &params(), GFS_LEVELS);
    assert_eq!(query.get("leftlon"), Some("-1"));
    assert_eq!(query.get("rightlon"), Some("1"));
    assert_eq!(query.get("toplat"), Some("1"));
    assert_eq!(query.get("bottomlat"), Some("-1"));
    assert_eq!(query.get("file"), Some("gfs.t00z.pgrb2.0p25.f048"));
}
