//! Driver for the standalone landing predictor binary.
//!
//! The binary reads a scenario on stdin, integrates the flight through the
//! grid files in a dataset directory and prints the track as
//! `timestamp,lat,lon,alt` lines.

mod error;
mod runner;
mod scenario;
mod track;

pub use error::{PredictorError, Result};
pub use runner::Predictor;
pub use scenario::Scenario;
pub use track::{Track, TrackPoint};
