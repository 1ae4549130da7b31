//! Labeled dataset directories.
//!
//! A run is assembled in a [`ScratchDataset`] and only reaches the
//! published directory through [`DatasetDirectory::publish`], which refuses
//! to replace a dataset with one from the same or an older run unless
//! forced.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use gfs_common::time::parse_label;
use gfs_common::{GfsError, GfsResult, ModelRun};

/// Name of the label file holding the run label.
pub const LABEL_FILE: &str = "dataset.txt";

const GRID_PREFIX: &str = "gfs_";
const GRID_SUFFIX: &str = ".dat";
const STAGED_DIR: &str = "dataset";

/// Temporary directory a run is written into before publishing.
///
/// Removed when dropped, whether or not it was published.
#[derive(Debug)]
pub struct ScratchDataset {
    dir: TempDir,
    run: ModelRun,
}

impl ScratchDataset {
    /// Create under the system temp directory and write the label file.
    pub fn create(run: ModelRun) -> GfsResult<Self> {
        let dir = tempfile::Builder::new().prefix("gfs-scratch-").tempdir()?;
        std::fs::write(dir.path().join(LABEL_FILE), format!("{}\n", run.label()))?;
        debug!(path = %dir.path().display(), run = %run.label(), "Created scratch dataset");
        Ok(Self { dir, run })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn run(&self) -> &ModelRun {
        &self.run
    }

    /// Grid files written so far, sorted by name.
    pub fn grid_files(&self) -> GfsResult<Vec<PathBuf>> {
        list_grid_files(self.path())
    }

    /// Remove the directory now, reporting any failure.
    pub fn close(self) -> GfsResult<()> {
        self.dir.close()?;
        Ok(())
    }
}

/// Outcome of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { files: Vec<PathBuf> },
    /// The destination already holds this run or a newer one.
    NoNewData { existing: DateTime<Utc> },
}

/// The published dataset location.
#[derive(Debug, Clone)]
pub struct DatasetDirectory {
    root: PathBuf,
}

impl DatasetDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Issue time of the dataset currently published, if any.
    ///
    /// A label that does not parse is logged and treated as absent so the
    /// next run replaces it.
    pub fn current_label(&self) -> GfsResult<Option<DateTime<Utc>>> {
        let path = self.root.join(LABEL_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match parse_label(&text) {
            Ok(issue_time) => Ok(Some(issue_time)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed dataset label");
                Ok(None)
            }
        }
    }

    /// True when `run` is newer than what is published.
    pub fn needs_refresh(&self, run: &ModelRun) -> GfsResult<bool> {
        Ok(match self.current_label()? {
            Some(existing) => existing < run.issue_time,
            None => true,
        })
    }

    /// Replace the published dataset with `scratch` if it is newer, or
    /// unconditionally when `force` is set.
    #[instrument(skip(self, scratch), fields(root = %self.root.display(), run = %scratch.run().label()))]
    pub fn publish(&self, scratch: ScratchDataset, force: bool) -> GfsResult<PublishOutcome> {
        if let Some(existing) = self.current_label()? {
            if existing >= scratch.run().issue_time && !force {
                info!(existing = %existing, "Destination is up to date, nothing published");
                return Ok(PublishOutcome::NoNewData { existing });
            }
        }

        let parent = match self.root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        // Stage next to the destination so the swap is a rename
        let staging = tempfile::Builder::new()
            .prefix(".gfs-staging-")
            .tempdir_in(&parent)?;
        let staged = staging.path().join(STAGED_DIR);
        std::fs::create_dir(&staged)?;
        copy_tree(scratch.path(), &staged)?;

        self.swap_in(&parent, &staged)?;
        let files = list_grid_files(&self.root)?;
        info!(files = files.len(), "Published dataset");

        scratch.close()?;
        Ok(PublishOutcome::Published { files })
    }

    /// Replace the destination with `staged`, restoring the previous
    /// contents if the final rename fails.
    fn swap_in(&self, parent: &Path, staged: &Path) -> GfsResult<()> {
        if !self.root.exists() {
            std::fs::rename(staged, &self.root)?;
            return Ok(());
        }

        let previous = tempfile::Builder::new()
            .prefix(".gfs-previous-")
            .tempdir_in(parent)?;
        let retired = previous.path().join(STAGED_DIR);
        std::fs::rename(&self.root, &retired)?;

        if let Err(e) = std::fs::rename(staged, &self.root) {
            warn!(error = %e, "Could not move staged dataset into place, restoring previous");
            std::fs::rename(&retired, &self.root)?;
            return Err(e.into());
        }

        debug!(root = %self.root.display(), "Swapped in new dataset");
        Ok(())
    }
}

fn copy_tree(from: &Path, to: &Path) -> GfsResult<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(|e| GfsError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| GfsError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn list_grid_files(dir: &Path) -> GfsResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| grid_file_time(path).is_some())
        .collect();
    files.sort();
    Ok(files)
}

/// Valid time encoded in a grid file name, `gfs_<posix>_...dat`.
fn grid_file_time(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    let rest = name.strip_prefix(GRID_PREFIX)?;
    if !rest.ends_with(GRID_SUFFIX) {
        return None;
    }
    let seconds = rest.split('_').next()?.parse::<i64>().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}

/// Issue time of the run published in `dir`, read from its label file.
pub fn dataset_age(dir: &Path) -> GfsResult<DateTime<Utc>> {
    let text = std::fs::read_to_string(dir.join(LABEL_FILE))?;
    parse_label(&text)
}

/// First and last valid time covered by the grid files in `dir`.
///
/// Names that do not carry a timestamp are skipped.
pub fn available_time_extent(dir: &Path) -> GfsResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let mut times = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| grid_file_time(&entry.path()));

    let Some(first) = times.next() else {
        return Ok(None);
    };
    let extent = times.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));
    Ok(Some(extent))
}
