use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::error::{PredictorError, Result};
use crate::scenario::Scenario;
use crate::track::Track;

/// Marker the predictor prints in its `--version` banner.
const VERSION_MARKER: &str = "Landing Prediction";

/// A validated predictor binary and dataset directory.
#[derive(Debug, Clone)]
pub struct Predictor {
    bin_path: PathBuf,
    gfs_dir: PathBuf,
}

impl Predictor {
    /// Check the binary and dataset directory before any prediction runs.
    pub async fn new(bin_path: impl Into<PathBuf>, gfs_dir: impl Into<PathBuf>) -> Result<Self> {
        let bin_path = bin_path.into();
        let gfs_dir = gfs_dir.into();

        if !bin_path.is_file() {
            return Err(PredictorError::BinaryNotFound(bin_path));
        }
        if !is_predictor(&bin_path).await {
            return Err(PredictorError::NotAPredictor(bin_path));
        }
        if !gfs_dir.is_dir() {
            return Err(PredictorError::DataDirNotFound(gfs_dir));
        }
        if !has_grid_files(&gfs_dir)? {
            return Err(PredictorError::NoGridFiles(gfs_dir));
        }

        debug!(bin = %bin_path.display(), gfs = %gfs_dir.display(), "Predictor ready");
        Ok(Self { bin_path, gfs_dir })
    }

    pub fn gfs_dir(&self) -> &Path {
        &self.gfs_dir
    }

    /// Run one prediction and return the parsed track.
    #[instrument(skip(self, scenario), fields(lat = scenario.launch_lat, lon = scenario.launch_lon, launch = %scenario.launch_time))]
    pub async fn predict(&self, scenario: &Scenario) -> Result<Track> {
        let mut cmd = Command::new(&self.bin_path);
        cmd.arg("-i")
            .arg(&self.gfs_dir)
            .env("TZ", "UTC")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if scenario.descent_mode {
            cmd.arg("-d");
        }

        let mut child = cmd.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(scenario.render().as_bytes()).await?;
            // Dropping stdin closes the pipe so the predictor starts
        }

        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "Predictor stderr");
        }
        if !output.status.success() {
            warn!(status = %output.status, "Predictor exited with failure status");
        }

        let track = Track::parse(&String::from_utf8_lossy(&output.stdout));
        info!(points = track.len(), "Prediction complete");
        Ok(track)
    }
}

async fn is_predictor(bin_path: &Path) -> bool {
    match Command::new(bin_path).arg("--version").output().await {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(VERSION_MARKER),
        Err(e) => {
            debug!(error = %e, "Could not run predictor --version");
            false
        }
    }
}

fn has_grid_files(dir: &Path) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("gfs_") && name.ends_with(".dat") {
            return Ok(true);
        }
    }
    Ok(false)
}
