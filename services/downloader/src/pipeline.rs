//! One end-to-end pipeline run: resolve, retrieve every hour, publish.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use gfs_common::{ForecastRequest, GfsError, GfsResult, ModelRun};
use wind_grid::{serialize, DatasetDirectory, PublishOutcome, RasterDecoder, ScratchDataset};

use crate::config::PipelineConfig;
use crate::fetcher::Fetcher;
use crate::resolver::Resolver;
use crate::source::ForecastSource;

/// Per-invocation switches that are not part of the configuration file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Wait for the newest run instead of falling back to older ones.
    pub wait: Option<Duration>,
    /// Publish even if the destination holds the same or a newer run.
    pub force: bool,
}

/// Result of a pipeline run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published {
        run: ModelRun,
        files: Vec<PathBuf>,
        skipped_hours: Vec<u32>,
    },
    NoNewData {
        run: ModelRun,
        existing: DateTime<Utc>,
    },
}

pub struct Pipeline<S> {
    config: Arc<PipelineConfig>,
    resolver: Resolver<S>,
    fetcher: Fetcher<S>,
    decoder: Box<dyn RasterDecoder>,
    dataset: DatasetDirectory,
}

impl<S: ForecastSource> Pipeline<S> {
    pub fn new(source: Arc<S>, config: Arc<PipelineConfig>) -> Self {
        Self {
            resolver: Resolver::new(source.clone(), config.clone()),
            fetcher: Fetcher::new(source, config.clone()),
            decoder: config.decoder.build(),
            dataset: DatasetDirectory::new(config.output_dir.clone()),
            config,
        }
    }

    /// Swap in a resolver, e.g. one with a fixed clock.
    pub fn with_resolver(mut self, resolver: Resolver<S>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Run the whole pipeline once.
    ///
    /// Hours that fail to download or decode are skipped. Resolution and
    /// publishing failures end the run with an error.
    #[instrument(skip(self), fields(model = %self.config.model, decoder = self.decoder.name()))]
    pub async fn run(&self, options: RunOptions) -> GfsResult<RunOutcome> {
        let model = self.config.model;
        let future = self.config.future_hours;

        let run = match options.wait {
            Some(timeout) => self.resolver.wait_for_latest(model, future, timeout).await?,
            None => self.resolver.resolve_latest(model, future).await?,
        };

        if !options.force && !self.dataset.needs_refresh(&run)? {
            if let Some(existing) = self.dataset.current_label()? {
                info!(run = %run.label(), existing = %existing, "No new data available");
                return Ok(RunOutcome::NoNewData { run, existing });
            }
        }

        let scratch = ScratchDataset::create(run)?;
        info!(run = %run.label(), scratch = %scratch.path().display(), "Starting download of wind data");

        let window = self.config.window();
        let mut skipped_hours = Vec::new();

        for hour in model.offsets_through(future) {
            let request = ForecastRequest::new(run, hour, window);

            let payload = match self.fetcher.fetch(&request).await {
                Ok(payload) => payload,
                Err(e) if e.is_per_hour() => {
                    warn!(hour, error = %e, "Could not download forecast hour, skipping");
                    skipped_hours.push(hour);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let raster = match self.decoder.decode(&payload) {
                Ok(raster) => raster,
                Err(e) if e.is_per_hour() => {
                    warn!(hour, error = %e, "Could not decode forecast hour, skipping");
                    skipped_hours.push(hour);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let path = serialize(&raster, scratch.path())?;
            info!(hour, path = %path.display(), "Grid file written");
        }

        if scratch.grid_files()?.is_empty() {
            warn!(run = %run.label(), "No forecast hour could be retrieved, keeping the published dataset");
            return Err(GfsError::EmptyDataset);
        }

        match self.dataset.publish(scratch, options.force)? {
            PublishOutcome::Published { files } => Ok(RunOutcome::Published {
                run,
                files,
                skipped_hours,
            }),
            PublishOutcome::NoNewData { existing } => Ok(RunOutcome::NoNewData { run, existing }),
        }
    }
}
