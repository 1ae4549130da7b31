//! Finding the newest model run that already carries the forecast horizon.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use gfs_common::{ForecastModel, ForecastRequest, GfsError, GfsResult, ModelRun};

use crate::config::PipelineConfig;
use crate::source::{ForecastSource, SourceReply};

/// How many runs back `resolve_latest` looks, newest first.
pub const MAX_RUN_AGE: u32 = 5;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct Resolver<S> {
    source: Arc<S>,
    config: Arc<PipelineConfig>,
    clock: Clock,
}

impl<S: ForecastSource> Resolver<S> {
    pub fn new(source: Arc<S>, config: Arc<PipelineConfig>) -> Self {
        Self {
            source,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used to pick candidate runs.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Ask for a 1x1 degree window at the origin for `forecast_hour` of `run`.
    ///
    /// A non-OK status means unavailable straight away; transport failures
    /// are retried and count as unavailable once the budget is spent.
    #[instrument(skip(self, run), fields(run = %run.label()))]
    pub async fn probe(&self, run: &ModelRun, forecast_hour: u32) -> bool {
        let query = ForecastRequest::probe(*run, forecast_hour).filter_query(
            &self.config.filter_url,
            &self.config.variables,
            &self.config.levels,
        );
        let max_attempts = self.config.probe_retries + 1;

        for attempt in 1..=max_attempts {
            match self.source.get(&query).await {
                Ok(SourceReply::Data(_)) => return true,
                Ok(SourceReply::Unavailable(status)) => {
                    info!(status, "Run not available yet");
                    return false;
                }
                Err(e) => {
                    warn!(error = %e, attempt, max_attempts, "Probe failed, retrying");
                }
            }
        }

        warn!(max_attempts, "Probe retries exhausted, treating run as unavailable");
        false
    }

    /// Newest of the last [`MAX_RUN_AGE`] runs that has `forecast_hours`.
    #[instrument(skip(self, model), fields(model = %model))]
    pub async fn resolve_latest(&self, model: ForecastModel, forecast_hours: u32) -> GfsResult<ModelRun> {
        let hour = model.nearest_offset(forecast_hours);
        let now = (self.clock)();

        for age in 0..MAX_RUN_AGE {
            let run = ModelRun::latest(model, now, age);
            info!(run = %run.label(), hour, "Testing model run");
            if self.probe(&run, hour).await {
                info!(run = %run.label(), "Found valid data");
                return Ok(run);
            }
        }

        Err(GfsError::NoAvailableDataset {
            forecast_hour: hour,
            runs_checked: MAX_RUN_AGE,
        })
    }

    /// Poll the newest run until it has `forecast_hours` or `timeout` runs out.
    ///
    /// Unlike [`Resolver::resolve_latest`] this never falls back to older
    /// runs.
    #[instrument(skip(self, model), fields(model = %model))]
    pub async fn wait_for_latest(
        &self,
        model: ForecastModel,
        forecast_hours: u32,
        timeout: Duration,
    ) -> GfsResult<ModelRun> {
        let hour = model.nearest_offset(forecast_hours);
        let deadline = tokio::time::Instant::now() + timeout;
        let poll = self.config.poll_interval();

        while tokio::time::Instant::now() < deadline {
            let run = ModelRun::latest(model, (self.clock)(), 0);
            info!(run = %run.label(), hour, "Testing model run");
            if self.probe(&run, hour).await {
                info!(run = %run.label(), "Found valid data");
                return Ok(run);
            }

            info!(poll_secs = poll.as_secs(), "Newest run lacks the required data, waiting");
            tokio::time::sleep(poll).await;
        }

        Err(GfsError::Timeout(timeout))
    }
}
