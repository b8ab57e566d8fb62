//! Error types for rbf_insight

use thiserror::Error;

/// Result type alias for rbf_insight operations
pub type Result<T> = std::result::Result<T, RbfError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum RbfError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RbfError {
    pub(crate) fn shape(expected: impl ToString, actual: impl ToString) -> Self {
        RbfError::ShapeError {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn invalid(name: &str, value: impl ToString, reason: &str) -> Self {
        RbfError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for RbfError {
    fn from(err: serde_json::Error) -> Self {
        RbfError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for RbfError {
    fn from(err: ndarray::ShapeError) -> Self {
        RbfError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
