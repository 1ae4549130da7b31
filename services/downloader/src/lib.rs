//! GFS wind window downloader.
//!
//! Finds the newest GFS run that already carries the requested forecast
//! horizon, pulls a lat/lon window of height and wind for every forecast
//! hour up to that horizon through the NOMADS grib filter, converts each
//! hour into a grid file and publishes the set as one labeled dataset.

pub mod config;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
pub mod source;

pub use config::PipelineConfig;
pub use fetcher::Fetcher;
pub use pipeline::{Pipeline, RunOptions, RunOutcome};
pub use resolver::Resolver;
pub use source::{ForecastSource, HttpSource, SourceReply, TransportFailure};
