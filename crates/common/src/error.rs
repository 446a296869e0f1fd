//! Error types shared across gazekit crates.

use std::path::PathBuf;

/// Top-level error type for gazekit operations.
#[derive(Debug, thiserror::Error)]
pub enum GazekitError {
    #[error("Calibration error: {message}")]
    Calibration { message: String },

    #[error("Tracking error: {message}")]
    Tracking { message: String },

    #[error("Analytics error: {message}")]
    Analytics { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Feature-vector length diverged between training and prediction.
    /// This is a configuration defect, never a runtime data condition,
    /// so it aborts the operation instead of recovering silently.
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GazekitError.
pub type GazekitResult<T> = Result<T, GazekitError>;

impl GazekitError {
    pub fn calibration(msg: impl Into<String>) -> Self {
        Self::Calibration {
            message: msg.into(),
        }
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking {
            message: msg.into(),
        }
    }

    pub fn analytics(msg: impl Into<String>) -> Self {
        Self::Analytics {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
