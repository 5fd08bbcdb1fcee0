//! Real-time closed-loop simulation of the pressure actuator.
//!
//! Provides:
//! - Fixed-step RK4 and forward Euler integrators over a transient model
//! - Simulation clock with a fixed telemetry cadence
//! - The engine context owning the augmented state and active closed loop
//! - Display-only projection of the state into telemetry samples
//! - Offline runs and step-response metrics

pub mod clock;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod metrics;
pub mod model;
pub mod projection;
pub mod sim;

pub use clock::SimulationClock;
pub use engine::{Engine, RunState};
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use metrics::StepMetrics;
pub use model::{ClosedLoopModel, TransientModel};
pub use projection::{DisplayLimits, Sample, SampleProjection};
pub use sim::{SimOptions, SimRecord, run_for};
