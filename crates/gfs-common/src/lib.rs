//! Common types and utilities shared across the GFS wind grid crates.

pub mod bbox;
pub mod error;
pub mod model;
pub mod request;
pub mod time;

pub use bbox::{FilterBox, Window};
pub use error::{GfsError, GfsResult};
pub use model::{ForecastModel, GFS_LEVELS, GFS_PARAMS};
pub use request::{FilterQuery, ForecastRequest};
pub use time::{latest_run, ModelRun};
