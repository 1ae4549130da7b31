//! GFS wind grid downloader.
//!
//! Resolves the newest usable GFS run, retrieves a wind window for every
//! forecast hour up to the horizon and publishes the grid files into the
//! output directory. Exits 0 when there is nothing newer to publish.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use gfs_common::ForecastModel;
use gfs_downloader::{HttpSource, Pipeline, PipelineConfig, RunOptions, RunOutcome};
use wind_grid::DecoderKind;

#[derive(Parser, Debug)]
#[command(name = "gfs-downloader")]
#[command(about = "Download a GFS wind window and publish it as grid files")]
struct Args {
    /// Optional YAML pipeline configuration
    #[arg(long, env = "GFS_CONFIG")]
    config: Option<PathBuf>,

    /// GFS model to use (0p25_1hr or 0p50)
    #[arg(short, long, env = "GFS_MODEL")]
    model: Option<ForecastModel>,

    /// Save data at most this many hours into the future
    #[arg(short, long)]
    future: Option<u32>,

    /// Window centre latitude, degrees north
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Window centre longitude, degrees east
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Window half-height in degrees latitude
    #[arg(long)]
    latdelta: Option<f64>,

    /// Window half-width in degrees longitude
    #[arg(long)]
    londelta: Option<f64>,

    /// Directory the dataset is published into
    #[arg(short, long, env = "GFS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Only accept the newest run, waiting up to this many minutes for it
    #[arg(long, default_value = "0")]
    wait: u64,

    /// Publish even if the output already holds this run
    #[arg(long)]
    force: bool,

    /// Raster decoder backend (native or grib)
    #[arg(long, env = "GFS_DECODER")]
    decoder: Option<DecoderKind>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Apply command line overrides on top of the file configuration.
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(future) = self.future {
            config.future_hours = future;
        }
        if let Some(lat) = self.lat {
            config.window.lat = lat;
        }
        if let Some(lon) = self.lon {
            config.window.lon = lon;
        }
        if let Some(latdelta) = self.latdelta {
            config.window.lat_delta = latdelta;
        }
        if let Some(londelta) = self.londelta {
            config.window.lon_delta = londelta;
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(decoder) = self.decoder {
            config.decoder = decoder;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let config = Arc::new(args.apply(config));

    info!(
        model = %config.model,
        future_hours = config.future_hours,
        lat = config.window.lat,
        lon = config.window.lon,
        output_dir = %config.output_dir.display(),
        decoder = %config.decoder,
        "Starting GFS wind downloader"
    );

    let source = Arc::new(HttpSource::new(&config)?);
    let pipeline = Pipeline::new(source, config.clone());

    let options = RunOptions {
        wait: (args.wait > 0).then(|| Duration::from_secs(args.wait * 60)),
        force: args.force,
    };

    match pipeline.run(options).await {
        Ok(RunOutcome::Published {
            run,
            files,
            skipped_hours,
        }) => {
            info!(
                run = %run.label(),
                files = files.len(),
                skipped = skipped_hours.len(),
                "Dataset published"
            );
            Ok(())
        }
        Ok(RunOutcome::NoNewData { run, existing }) => {
            info!(run = %run.label(), existing = %existing, "No new data available");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Pipeline run failed");
            Err(e).context("GFS download failed")
        }
    }
}
