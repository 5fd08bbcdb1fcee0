//! Error types for simulation operations.

use pl_control::{ControlError, ControllerGains};
use pl_plant::PlantError;
use thiserror::Error;

/// Errors encountered while running the closed loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Plant(#[from] PlantError),

    /// A gain update was refused; the previous closed loop stays active.
    #[error("Closed-loop construction rejected: {0}")]
    Rebuild(#[from] ControlError),

    /// The state left the finite range or the sanity bound. Not retryable.
    #[error(
        "Integration diverged at t={time:.3}s with {gains}; last finite state {last_good_state:?}"
    )]
    IntegrationDiverged {
        time: f64,
        gains: ControllerGains,
        last_good_state: Vec<f64>,
    },

    #[error("Invalid step-response series: {what}")]
    InvalidSeries { what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;
