//! Error types for the GFS wind grid pipeline.

use thiserror::Error;

/// Result type alias using GfsError.
pub type GfsResult<T> = Result<T, GfsError>;

/// Primary error type for dataset resolution, retrieval and grid handling.
#[derive(Debug, Error)]
pub enum GfsError {
    // === Availability ===
    #[error("No available dataset found for T+{forecast_hour} in the last {runs_checked} model runs")]
    NoAvailableDataset {
        forecast_hour: u32,
        runs_checked: u32,
    },

    #[error("Timed out after {0:?} waiting for the newest model run")]
    Timeout(std::time::Duration),

    // === Retrieval ===
    #[error("Transport error after {attempts} attempts: {message}")]
    TransportError { attempts: u32, message: String },

    // === Decoding ===
    #[error("Decoded raster has no usable bands")]
    EmptyDataset,

    #[error("Failed to decode raster: {0}")]
    Decode(String),

    // === Grid files ===
    #[error("Grid file format error: {0}")]
    FormatError(String),

    // === Configuration ===
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GfsError {
    /// Shorthand for a grid file format error.
    pub fn format(message: impl Into<String>) -> Self {
        GfsError::FormatError(message.into())
    }

    /// True for failures that are recovered by skipping one forecast hour.
    pub fn is_per_hour(&self) -> bool {
        matches!(
            self,
            GfsError::TransportError { .. } | GfsError::EmptyDataset | GfsError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_hour_failures() {
        let transport = GfsError::TransportError {
            attempts: 2,
            message: "timed out".to_string(),
        };
        assert!(transport.is_per_hour());
        assert!(GfsError::EmptyDataset.is_per_hour());
        assert!(GfsError::Decode("bad".to_string()).is_per_hour());

        assert!(!GfsError::Config("bad".to_string()).is_per_hour());
        assert!(!GfsError::format("short").is_per_hour());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(!GfsError::from(io).is_per_hour());
    }
}
