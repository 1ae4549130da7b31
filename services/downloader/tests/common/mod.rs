//! Shared fakes for downloader integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use gfs_common::FilterQuery;
use gfs_downloader::{ForecastSource, PipelineConfig, SourceReply, TransportFailure};

type Responder = dyn Fn(&FilterQuery) -> Result<SourceReply, TransportFailure> + Send + Sync;

/// Upstream stand-in that answers from a closure and records every query.
pub struct FakeSource {
    responder: Box<Responder>,
    queries: Mutex<Vec<FilterQuery>>,
}

impl FakeSource {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&FilterQuery) -> Result<SourceReply, TransportFailure> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<FilterQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// The `dir` parameter of every query, in order.
    pub fn dirs(&self) -> Vec<String> {
        self.queries()
            .iter()
            .map(|q| q.get("dir").unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl ForecastSource for FakeSource {
    async fn get(&self, query: &FilterQuery) -> Result<SourceReply, TransportFailure> {
        self.queries.lock().unwrap().push(query.clone());
        (self.responder)(query)
    }
}

/// True for the 1x1 degree probe window.
pub fn is_probe(query: &FilterQuery) -> bool {
    query.get("leftlon") == Some("-1") && query.get("toplat") == Some("1")
}

/// 2018-02-19 13:30Z: the newest run is 12Z.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 2, 19, 13, 30, 0).unwrap()
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        probe_retries: 2,
        retries: 1,
        ..PipelineConfig::default()
    }
}
