//! Access to the upstream grib filter.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};

use gfs_common::FilterQuery;

use crate::config::PipelineConfig;

/// What the upstream answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReply {
    /// HTTP 200 with the GRIB2 payload.
    Data(Bytes),
    /// Any other status: the file is not (yet) available.
    Unavailable(u16),
}

/// The request never produced a status: connect failure, timeout, reset.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

/// Seam between the resolver/fetcher and the network.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn get(&self, query: &FilterQuery) -> Result<SourceReply, TransportFailure>;
}

/// HTTP implementation against the NOMADS grib filter.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &PipelineConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastSource for HttpSource {
    #[instrument(skip(self, query), fields(url = %query.url, file = query.get("file").unwrap_or_default()))]
    async fn get(&self, query: &FilterQuery) -> Result<SourceReply, TransportFailure> {
        let response = self
            .client
            .get(&query.url)
            .query(&query.params)
            .send()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "Upstream reports data unavailable");
            return Ok(SourceReply::Unavailable(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure(format!("reading body: {}", e)))?;
        Ok(SourceReply::Data(body))
    }
}
