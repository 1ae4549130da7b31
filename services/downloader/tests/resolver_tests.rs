//! Run resolution against a fake upstream.

mod common;

use std::sync::Arc;
use std::time::Duration;

use gfs_common::{ForecastModel, GfsError, ModelRun};
use gfs_downloader::{Resolver, SourceReply, TransportFailure};

use common::{fixed_now, test_config, FakeSource};

fn resolver(source: Arc<FakeSource>) -> Resolver<FakeSource> {
    Resolver::new(source, Arc::new(test_config())).with_clock(fixed_now)
}

// ============================================================================
// resolve_latest
// ============================================================================

#[tokio::test]
async fn test_falls_back_to_older_run() {
    let source = FakeSource::new(|q| {
        if q.get("dir") == Some("/gfs.2018021900") {
            Ok(SourceReply::Data(bytes::Bytes::from_static(b"GRIB")))
        } else {
            Ok(SourceReply::Unavailable(404))
        }
    });

    let run = resolver(source.clone())
        .resolve_latest(ForecastModel::Gfs0p25Hourly, 48)
        .await
        .unwrap();

    assert_eq!(run.label(), "2018021900z");
    assert_eq!(
        source.dirs(),
        vec!["/gfs.2018021912", "/gfs.2018021906", "/gfs.2018021900"]
    );
}

#[tokio::test]
async fn test_probe_uses_snapped_hour_and_origin_window() {
    let source = FakeSource::new(|_| Ok(SourceReply::Data(bytes::Bytes::new())));

    resolver(source.clone())
        .resolve_latest(ForecastModel::Gfs0p50, 47)
        .await
        .unwrap();

    let queries = source.queries();
    assert_eq!(queries.len(), 1);
    let q = &queries[0];
    assert_eq!(q.url, "http://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_0p50.pl");
    assert_eq!(q.get("file"), Some("gfs.t12z.pgrb2full.0p50.f048"));
    assert_eq!(q.get("leftlon"), Some("-1"));
    assert_eq!(q.get("rightlon"), Some("1"));
    assert_eq!(q.get("toplat"), Some("1"));
    assert_eq!(q.get("bottomlat"), Some("-1"));
}

#[tokio::test]
async fn test_no_run_available() {
    let source = FakeSource::new(|_| Ok(SourceReply::Unavailable(404)));

    let err = resolver(source.clone())
        .resolve_latest(ForecastModel::Gfs0p25Hourly, 400)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GfsError::NoAvailableDataset {
            forecast_hour: 384,
            runs_checked: 5
        }
    ));
    // One probe per run, status failures are not retried
    assert_eq!(source.queries().len(), 5);
    assert_eq!(source.dirs()[4], "/gfs.2018021812");
}

#[tokio::test]
async fn test_transport_failures_retried_then_unavailable() {
    let source = FakeSource::new(|q| {
        if q.get("dir") == Some("/gfs.2018021912") {
            Err(TransportFailure("connection reset".to_string()))
        } else {
            Ok(SourceReply::Data(bytes::Bytes::new()))
        }
    });

    let run = resolver(source.clone())
        .resolve_latest(ForecastModel::Gfs0p25Hourly, 6)
        .await
        .unwrap();

    assert_eq!(run.label(), "2018021906z");
    // probe_retries = 2: three attempts on the 12Z run, then one on 06Z
    assert_eq!(
        source.dirs(),
        vec![
            "/gfs.2018021912",
            "/gfs.2018021912",
            "/gfs.2018021912",
            "/gfs.2018021906"
        ]
    );
}

// ============================================================================
// wait_for_latest
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_times_out() {
    let source = FakeSource::new(|_| Ok(SourceReply::Unavailable(404)));

    let err = resolver(source.clone())
        .wait_for_latest(ForecastModel::Gfs0p25Hourly, 48, Duration::from_secs(600))
        .await
        .unwrap_err();

    assert!(matches!(err, GfsError::Timeout(d) if d == Duration::from_secs(600)));
    // Polls at 0, 2, 4, 6 and 8 minutes, never an older run
    assert_eq!(source.queries().len(), 5);
    assert!(source.dirs().iter().all(|d| d == "/gfs.2018021912"));
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_once_newest_appears() {
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let source = FakeSource::new(move |_| {
        if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) < 2 {
            Ok(SourceReply::Unavailable(404))
        } else {
            Ok(SourceReply::Data(bytes::Bytes::new()))
        }
    });

    let started = tokio::time::Instant::now();
    let run = resolver(source.clone())
        .wait_for_latest(ForecastModel::Gfs0p25Hourly, 48, Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(run, ModelRun::latest(ForecastModel::Gfs0p25Hourly, fixed_now(), 0));
    assert_eq!(source.queries().len(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(240));
}
