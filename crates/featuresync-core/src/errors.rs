//! Error types for the featuresync core library.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;

/// Top-level error enum for the featuresync core library.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid level {level}: must not be negative")]
    InvalidLevel { level: i64 },

    #[error("Level mismatch: local summary is level {local}, remote summary is level {remote}")]
    LevelMismatch { local: usize, remote: usize },

    #[error("Summary requested before the grouping pass ended")]
    IncompleteSummary,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Hex error: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<SyncError> for PyErr {
    fn from(err: SyncError) -> PyErr {
        match &err {
            SyncError::InvalidLevel { .. }
            | SyncError::LevelMismatch { .. }
            | SyncError::InvalidHex(_)
            | SyncError::Json(_)
            | SyncError::Config(_) => PyValueError::new_err(err.to_string()),
            SyncError::IncompleteSummary => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
