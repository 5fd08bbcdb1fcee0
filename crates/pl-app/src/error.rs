//! Error types for the pl-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// the stream surfaces.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Controller error: {0}")]
    Control(String),

    #[error("Malformed command {line:?}: {reason}")]
    MalformedCommand { line: String, reason: String },

    #[error("Telemetry sink unavailable")]
    SinkUnavailable,

    #[error("Signal handler error: {0}")]
    Signal(String),

    #[error(transparent)]
    Simulation(#[from] pl_sim::SimError),

    #[error("Telemetry encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<pl_plant::PlantError> for AppError {
    fn from(err: pl_plant::PlantError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<pl_control::ControlError> for AppError {
    fn from(err: pl_control::ControlError) -> Self {
        AppError::Control(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(format!("invalid YAML: {err}"))
    }
}
