//! Error types for volume conversion operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for volconv operations
#[derive(Error, Debug)]
pub enum VolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(
        "Shape mismatch in {}: got {}x{}, expected {}x{}",
        file.display(),
        actual.0,
        actual.1,
        expected.0,
        expected.1
    )]
    ShapeMismatch {
        file: PathBuf,
        /// (height, width) of the offending slice
        actual: (usize, usize),
        /// (height, width) set by the first slice
        expected: (usize, usize),
    },

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Truncated input: expected {expected} elements, only {available} available")]
    TruncatedInput { expected: usize, available: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Specialized Result type for volconv operations
pub type Result<T> = std::result::Result<T, VolError>;

impl From<serde_json::Error> for VolError {
    fn from(err: serde_json::Error) -> Self {
        VolError::Serialization(err.to_string())
    }
}

impl From<glob::PatternError> for VolError {
    fn from(err: glob::PatternError) -> Self {
        VolError::InvalidArgument(format!("bad glob pattern: {}", err))
    }
}

impl From<ndarray::ShapeError> for VolError {
    fn from(err: ndarray::ShapeError) -> Self {
        VolError::Format(err.to_string())
    }
}
