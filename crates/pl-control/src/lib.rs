//! PID closed-loop construction for the pressure plant.
//!
//! The controller is folded into the plant as a single augmented linear
//! system driven only by the setpoint:
//!
//! ```text
//! ẋ_aug = A_cl·x_aug + B_ref·r,    y = C_cl·x_aug
//! ```
//!
//! The derivative term depends on the control input through the plant's
//! input coupling. The builder solves that algebraic loop explicitly instead
//! of substituting `u` into its own derivative expression.

pub mod closed_loop;
pub mod error;
pub mod gains;
pub mod poles;

pub use closed_loop::{ClosedLoopSystem, SINGULARITY_TOL};
pub use error::{ControlError, ControlResult};
pub use gains::ControllerGains;
pub use poles::{DominantPole, PoleReport, analyze};
