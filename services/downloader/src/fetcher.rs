//! Retrieval of one forecast hour over the configured window.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use gfs_common::{ForecastRequest, GfsError, GfsResult};

use crate::config::PipelineConfig;
use crate::source::{ForecastSource, SourceReply};

pub struct Fetcher<S> {
    source: Arc<S>,
    config: Arc<PipelineConfig>,
}

impl<S: ForecastSource> Fetcher<S> {
    pub fn new(source: Arc<S>, config: Arc<PipelineConfig>) -> Self {
        Self { source, config }
    }

    /// GET the GRIB2 payload for `request`.
    ///
    /// Non-OK statuses and transport failures are retried back to back until
    /// the retry budget is spent.
    #[instrument(skip(self, request), fields(run = %request.run.label(), hour = request.forecast_hour))]
    pub async fn fetch(&self, request: &ForecastRequest) -> GfsResult<Bytes> {
        let query = request.filter_query(
            &self.config.filter_url,
            &self.config.variables,
            &self.config.levels,
        );
        let max_attempts = self.config.retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            match self.source.get(&query).await {
                Ok(SourceReply::Data(bytes)) => {
                    info!(
                        bytes = bytes.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        attempt,
                        "Downloaded forecast hour"
                    );
                    return Ok(bytes);
                }
                Ok(SourceReply::Unavailable(status)) => {
                    last_error = format!("HTTP status {}", status);
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                warn!(error = %last_error, attempt, max_attempts, "Download failed, retrying");
            }
        }

        Err(GfsError::TransportError {
            attempts: max_attempts,
            message: last_error,
        })
    }
}
