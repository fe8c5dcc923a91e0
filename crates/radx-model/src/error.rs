//! Error types for the radar volume model.

use thiserror::Error;

/// Result type alias using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building, validating or slicing a volume.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Sweep index {index} out of range, volume has {n_sweeps} sweeps")]
    SweepOutOfRange { index: usize, n_sweeps: usize },

    #[error("Invalid sweep ray range for sweep {sweep_number}: {message}")]
    InvalidSweepRange { sweep_number: i32, message: String },

    #[error("Ray {ray_index}: {message}")]
    InvalidRay { ray_index: usize, message: String },

    #[error("Failed to parse volume document: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Create an InvalidRay error.
    pub fn invalid_ray(ray_index: usize, message: impl Into<String>) -> Self {
        Self::InvalidRay {
            ray_index,
            message: message.into(),
        }
    }

    /// Create an InvalidSweepRange error.
    pub fn invalid_sweep_range(sweep_number: i32, message: impl Into<String>) -> Self {
        Self::InvalidSweepRange {
            sweep_number,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for ModelError {
    fn from(err: serde_yaml::Error) -> Self {
        ModelError::Parse(format!("YAML error: {}", err))
    }
}
