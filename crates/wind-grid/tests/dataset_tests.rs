//! Scratch assembly and publication of dataset directories.

use chrono::{TimeZone, Utc};
use gfs_common::{ForecastModel, ModelRun};
use test_utils::fixtures::dir_listing;
use test_utils::grib2::concat_messages;
use test_utils::Grib2Builder;
use wind_grid::{
    available_time_extent, dataset_age, serialize, DatasetDirectory, NativeDecoder, PublishOutcome,
    RasterDecoder, ScratchDataset, LABEL_FILE,
};

fn run(day: u32, hour: u32) -> ModelRun {
    ModelRun::new(
        ForecastModel::Gfs0p25Hourly,
        Utc.with_ymd_and_hms(2018, 2, day, hour, 0, 0).unwrap(),
    )
}

/// A scratch dataset holding one grid file per forecast hour.
fn scratch_with_hours(run: ModelRun, hours: &[u32]) -> ScratchDataset {
    let scratch = ScratchDataset::create(run).unwrap();
    for &hour in hours {
        let payload = concat_messages(vec![
            Grib2Builder::hgt(500).with_forecast_hour(hour).with_constant_value(5500.0),
            Grib2Builder::ugrd(500).with_forecast_hour(hour).with_constant_value(3.0),
            Grib2Builder::vgrd(500).with_forecast_hour(hour).with_constant_value(-1.0),
        ]);
        let raster = NativeDecoder.decode(&payload).unwrap();
        serialize(&raster, scratch.path()).unwrap();
    }
    scratch
}

// ============================================================================
// Publishing
// ============================================================================

#[test]
fn test_publish_into_missing_directory() {
    let parent = tempfile::tempdir().unwrap();
    let dest = DatasetDirectory::new(parent.path().join("gfs"));

    let scratch = scratch_with_hours(run(19, 0), &[0, 1]);
    let scratch_path = scratch.path().to_path_buf();
    let outcome = dest.publish(scratch, false).unwrap();

    match outcome {
        PublishOutcome::Published { files } => assert_eq!(files.len(), 2),
        other => panic!("expected Published, got {:?}", other),
    }
    assert!(!scratch_path.exists(), "scratch must be removed after publish");
    assert_eq!(dir_listing(parent.path()), vec!["gfs".to_string()]);
    assert_eq!(
        std::fs::read_to_string(dest.root().join(LABEL_FILE)).unwrap(),
        "2018021900z\n"
    );
}

#[test]
fn test_publish_same_run_twice_is_noop() {
    let parent = tempfile::tempdir().unwrap();
    let dest = DatasetDirectory::new(parent.path());

    dest.publish(scratch_with_hours(run(19, 6), &[0, 1, 2]), false).unwrap();
    let before = dir_listing(dest.root());

    let scratch = scratch_with_hours(run(19, 6), &[0]);
    let scratch_path = scratch.path().to_path_buf();
    let outcome = dest.publish(scratch, false).unwrap();

    assert_eq!(
        outcome,
        PublishOutcome::NoNewData {
            existing: run(19, 6).issue_time
        }
    );
    assert_eq!(dir_listing(dest.root()), before);
    assert!(!scratch_path.exists(), "scratch must be removed even when nothing is published");
}

#[test]
fn test_older_run_not_published_unless_forced() {
    let parent = tempfile::tempdir().unwrap();
    let dest = DatasetDirectory::new(parent.path());
    dest.publish(scratch_with_hours(run(19, 12), &[0]), false).unwrap();

    let outcome = dest.publish(scratch_with_hours(run(19, 6), &[0, 1]), false).unwrap();
    assert!(matches!(outcome, PublishOutcome::NoNewData { .. }));

    let outcome = dest.publish(scratch_with_hours(run(19, 6), &[0, 1]), true).unwrap();
    assert!(matches!(outcome, PublishOutcome::Published { ref files } if files.len() == 2));
    assert_eq!(dataset_age(dest.root()).unwrap(), run(19, 6).issue_time);
}

#[test]
fn test_newer_run_replaces_old_contents() {
    let parent = tempfile::tempdir().unwrap();
    let dest = DatasetDirectory::new(parent.path());
    dest.publish(scratch_with_hours(run(19, 0), &[0, 1, 2]), false).unwrap();
    std::fs::write(dest.root().join("stale.txt"), "left over").unwrap();

    assert!(dest.needs_refresh(&run(19, 6)).unwrap());
    assert!(!dest.needs_refresh(&run(19, 0)).unwrap());

    dest.publish(scratch_with_hours(run(19, 6), &[0]), false).unwrap();
    let listing = dir_listing(dest.root());
    assert_eq!(listing.len(), 2, "{:?}", listing);
    assert!(listing.contains(&LABEL_FILE.to_string()));
    assert!(!dest.root().join("stale.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_failed_publish_keeps_previous_dataset() {
    let parent = tempfile::tempdir().unwrap();
    let dest = DatasetDirectory::new(parent.path().join("gfs"));
    dest.publish(scratch_with_hours(run(19, 0), &[0, 1]), false).unwrap();
    let before = dir_listing(dest.root());

    // A dangling link cannot be copied, so staging fails part way
    let scratch = scratch_with_hours(run(19, 6), &[0]);
    std::os::unix::fs::symlink(
        scratch.path().join("missing.dat"),
        scratch.path().join("zz_broken.dat"),
    )
    .unwrap();

    assert!(dest.publish(scratch, false).is_err());
    assert_eq!(dir_listing(dest.root()), before);
    assert_eq!(dataset_age(dest.root()).unwrap(), run(19, 0).issue_time);

    // Only the published directory is left beside it
    assert_eq!(dir_listing(parent.path()), vec!["gfs".to_string()]);
}

// ============================================================================
// Inspection
// ============================================================================

#[test]
fn test_available_time_extent() {
    let parent = tempfile::tempdir().unwrap();
    let dest = DatasetDirectory::new(parent.path());
    dest.publish(scratch_with_hours(run(19, 0), &[0, 3, 6]), false).unwrap();
    std::fs::write(dest.root().join("gfs_readme.dat"), "not a grid").unwrap();

    let (first, last) = available_time_extent(dest.root()).unwrap().unwrap();
    assert_eq!(first, Utc.with_ymd_and_hms(2018, 2, 19, 0, 0, 0).unwrap());
    assert_eq!(last, Utc.with_ymd_and_hms(2018, 2, 19, 6, 0, 0).unwrap());
}

#[test]
fn test_dataset_age_without_label_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(dataset_age(dir.path()).is_err());
}
