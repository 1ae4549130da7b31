//! Landing predictions over a grid of burst altitudes and launch times.
//!
//! Every combination of `--altitude-deltas` and `--time-deltas` is run
//! through the predictor and the resulting landing is logged.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use predictor::{Predictor, Scenario};

#[derive(Parser, Debug)]
#[command(name = "predict")]
#[command(about = "Run balloon landing predictions against a published GFS dataset")]
struct Args {
    /// Predictor binary
    #[arg(long, env = "PRED_BINARY", default_value = "./pred")]
    pred_binary: PathBuf,

    /// Published GFS dataset directory
    #[arg(long, env = "GFS_PATH", default_value = "./gfs")]
    gfs_dir: PathBuf,

    /// Ascent rate (m/s)
    #[arg(short, long, default_value = "5.0")]
    ascent_rate: f64,

    /// Descent rate (m/s)
    #[arg(short, long, default_value = "5.0")]
    descent_rate: f64,

    /// Burst altitude (m)
    #[arg(short, long, default_value = "30000.0")]
    burst_alt: f64,

    /// Launch altitude (m)
    #[arg(long, default_value = "0.0")]
    launch_alt: f64,

    /// Launch latitude (decimal degrees)
    #[arg(long, default_value = "-34.9499", allow_hyphen_values = true)]
    latitude: f64,

    /// Launch longitude (decimal degrees)
    #[arg(long, default_value = "138.5194", allow_hyphen_values = true)]
    longitude: f64,

    /// Launch time, RFC 3339 in UTC (default: now)
    #[arg(long)]
    time: Option<DateTime<Utc>>,

    /// Comma-separated burst altitude deltas (m)
    #[arg(long, value_delimiter = ',', default_value = "0", allow_hyphen_values = true)]
    altitude_deltas: Vec<f64>,

    /// Comma-separated launch time deltas (hours)
    #[arg(long, value_delimiter = ',', default_value = "0", allow_hyphen_values = true)]
    time_deltas: Vec<f64>,

    /// Payload is already descending from the launch altitude
    #[arg(long)]
    descent_mode: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

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

    let predictor = Predictor::new(&args.pred_binary, &args.gfs_dir)
        .await
        .context("Failed to set up predictor")?;

    match wind_grid::dataset_age(predictor.gfs_dir()) {
        Ok(issue_time) => info!(
            run = %issue_time.format("%Y%m%d%Hz"),
            age_hours = (Utc::now() - issue_time).num_hours(),
            "Using GFS model run"
        ),
        Err(e) => warn!(error = %e, "Could not read dataset label"),
    }
    if let Ok(Some((first, last))) = wind_grid::available_time_extent(predictor.gfs_dir()) {
        info!(first = %first, last = %last, "Dataset time coverage");
    }

    let base_time = args.time.unwrap_or_else(Utc::now);
    let mut landings = 0usize;

    for delta_alt in &args.altitude_deltas {
        for delta_hours in &args.time_deltas {
            let scenario = Scenario {
                launch_lat: args.latitude,
                launch_lon: args.longitude,
                launch_alt: args.launch_alt,
                ascent_rate: args.ascent_rate,
                descent_rate: args.descent_rate,
                burst_alt: args.burst_alt + delta_alt,
                launch_time: base_time + Duration::seconds((delta_hours * 3600.0) as i64),
                descent_mode: args.descent_mode,
            };

            let track = predictor
                .predict(&scenario)
                .await
                .with_context(|| format!("Prediction failed for launch at {}", scenario.launch_time))?;

            if track.len() <= 1 {
                warn!(
                    launch = %scenario.launch_time,
                    burst_alt = scenario.burst_alt,
                    "Prediction produced no usable track, skipping"
                );
                continue;
            }

            if let Some(landing) = track.landing() {
                landings += 1;
                info!(
                    launch = %scenario.launch_time.to_rfc3339(),
                    ascent_rate = scenario.ascent_rate,
                    burst_alt = scenario.burst_alt,
                    descent_rate = scenario.descent_rate,
                    landing_lat = landing.lat,
                    landing_lon = landing.lon,
                    landing_time = %landing.time().map(|t| t.to_rfc3339()).unwrap_or_default(),
                    "Landing"
                );
            }
        }
    }

    info!(landings, "Predictions complete");
    Ok(())
}
