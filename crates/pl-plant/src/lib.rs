//! Open-loop plant model for the valve pressure actuator.
//!
//! The plant is a DC motor driving a valve through a gearbox, with the
//! valve angle setting a first-order pressure process:
//!
//! - **Electrical**: armature current `i`
//! - **Mechanical**: motor velocity `ω` and position `θm`
//! - **Process**: line pressure `P`, measured through a sensor gain
//!
//! Parameters are validated once; the resulting matrices are frozen.

pub mod error;
pub mod matrices;
pub mod params;

pub use error::{PlantError, PlantResult};
pub use matrices::{PlantMatrices, layout};
pub use params::PlantParams;
