//! Error types for plant construction.

use thiserror::Error;

/// Result type for plant operations.
pub type PlantResult<T> = Result<T, PlantError>;

/// Errors raised while building the plant model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlantError {
    /// Physical constants or matrices are unusable; the engine must not start.
    #[error("Invalid plant configuration: {what}")]
    Configuration { what: String },
}

impl From<pl_core::CoreError> for PlantError {
    fn from(e: pl_core::CoreError) -> Self {
        PlantError::Configuration {
            what: e.to_string(),
        }
    }
}
