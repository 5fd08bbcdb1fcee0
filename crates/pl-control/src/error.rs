//! Error types for closed-loop construction.

use crate::gains::ControllerGains;
use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while building or analysing the closed loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Gains outside the admissible range.
    #[error("Invalid gains: {what}")]
    InvalidGains { what: String },

    /// The derivative-feedback loop closure `1 + Kd·C·B` vanishes. `C·B`
    /// includes the sensor gain, so `denom` is in sensor units.
    #[error(
        "Structurally singular derivative feedback for {gains}: loop-closure denominator 1 + Kd·C·B = {denom:.3e} (sensor units)"
    )]
    StructuralSingularity { gains: ControllerGains, denom: f64 },

    /// Eigenvalue iteration did not converge.
    #[error("Pole analysis failed: {what}")]
    PoleAnalysis { what: &'static str },
}
