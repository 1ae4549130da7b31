//! Pipeline configuration.
//!
//! Everything is optional in the YAML file; missing keys fall back to the
//! NOMADS defaults below. Command line flags override the region, model and
//! output fields after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use gfs_common::model::DEFAULT_FILTER_URL;
use gfs_common::{ForecastModel, Window, GFS_LEVELS, GFS_PARAMS};
use wind_grid::DecoderKind;

/// Immutable settings handed to each pipeline component at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Filter script URL; `{model}` is replaced with the model name.
    #[serde(default = "default_filter_url")]
    pub filter_url: String,
    #[serde(default = "default_model")]
    pub model: ForecastModel,
    /// Forecast horizon in hours, snapped to the model table.
    #[serde(default = "default_future_hours")]
    pub future_hours: u32,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Isobaric levels in hPa.
    #[serde(default = "default_levels")]
    pub levels: Vec<u32>,
    #[serde(default = "default_variables")]
    pub variables: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Extra attempts after a failed fetch.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Extra attempts after a probe hits a transport failure.
    #[serde(default = "default_probe_retries")]
    pub probe_retries: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub decoder: DecoderKind,
}

/// Window centre and half-widths in degrees.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_lat")]
    pub lat: f64,
    #[serde(default = "default_lon")]
    pub lon: f64,
    #[serde(default = "default_delta")]
    pub lat_delta: f64,
    #[serde(default = "default_delta")]
    pub lon_delta: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lat: default_lat(),
            lon: default_lon(),
            lat_delta: default_delta(),
            lon_delta: default_delta(),
        }
    }
}

impl From<WindowConfig> for Window {
    fn from(w: WindowConfig) -> Self {
        Window::new(w.lat, w.lon, w.lat_delta, w.lon_delta)
    }
}

fn default_filter_url() -> String {
    DEFAULT_FILTER_URL.to_string()
}

fn default_model() -> ForecastModel {
    ForecastModel::Gfs0p25Hourly
}

fn default_future_hours() -> u32 {
    48
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./gfs")
}

fn default_levels() -> Vec<u32> {
    GFS_LEVELS.to_vec()
}

fn default_variables() -> Vec<String> {
    GFS_PARAMS.iter().map(|p| p.to_string()).collect()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_probe_retries() -> u32 {
    2
}

fn default_poll_interval() -> u64 {
    120
}

fn default_lat() -> f64 {
    -34.0
}

fn default_lon() -> f64 {
    138.0
}

fn default_delta() -> f64 {
    10.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter_url: default_filter_url(),
            model: default_model(),
            future_hours: default_future_hours(),
            window: WindowConfig::default(),
            output_dir: default_output_dir(),
            levels: default_levels(),
            variables: default_variables(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            retries: default_retries(),
            probe_retries: default_probe_retries(),
            poll_interval_secs: default_poll_interval(),
            decoder: DecoderKind::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), model = %config.model, "Loaded pipeline config");
        Ok(config)
    }

    pub fn window(&self) -> Window {
        self.window.into()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
