use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictorError>;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Predictor binary does not exist: {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("Not a landing predictor binary: {}", .0.display())]
    NotAPredictor(PathBuf),

    #[error("GFS data directory does not exist: {}", .0.display())]
    DataDirNotFound(PathBuf),

    #[error("No GFS data files in directory: {}", .0.display())]
    NoGridFiles(PathBuf),

    #[error("Failed to run predictor: {0}")]
    Io(#[from] std::io::Error),
}
