//! Engine options and offline (unpaced) runs.

use crate::engine::Engine;
use crate::error::{SimError, SimResult};
use crate::integrator::IntegratorType;
use crate::projection::{DisplayLimits, Sample};

/// Options for the simulation engine.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Fixed time step (seconds)
    pub dt: f64,
    /// Interval between emitted samples (seconds), rounded to whole steps
    pub output_interval: f64,
    /// Pressure setpoint (bar)
    pub setpoint: f64,
    /// Integrator type (default: RK4)
    pub integrator: IntegratorType,
    /// Infinity-norm bound on the state before the run is declared diverged
    pub divergence_bound: f64,
    /// Display ranges for emitted samples
    pub limits: DisplayLimits,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 0.01,
            output_interval: 0.1,
            setpoint: 500.0,
            integrator: IntegratorType::default(),
            divergence_bound: 1e9,
            limits: DisplayLimits::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive and finite",
            });
        }
        if !self.output_interval.is_finite() || self.output_interval <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "output interval must be positive and finite",
            });
        }
        if !self.setpoint.is_finite() {
            return Err(SimError::InvalidArg {
                what: "setpoint must be finite",
            });
        }
        if !self.divergence_bound.is_finite() || self.divergence_bound <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "divergence bound must be positive and finite",
            });
        }
        self.limits.validate()?;
        Ok(())
    }
}

/// Record of an offline run.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Sample times (seconds)
    pub t: Vec<f64>,
    /// Unclamped measured output at each sample (bar)
    pub y: Vec<f64>,
    /// Emitted samples
    pub samples: Vec<Sample>,
}

/// Step the engine for `duration` simulated seconds without pacing,
/// recording every emitted sample.
///
/// A stopped engine is started without resetting its state.
pub fn run_for(engine: &mut Engine, duration: f64) -> SimResult<SimRecord> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(SimError::InvalidArg {
            what: "duration must be non-negative and finite",
        });
    }
    engine.start(false);

    let ticks = (duration / engine.clock().dt()).round() as u64;
    let mut record = SimRecord::default();
    for _ in 0..ticks {
        if let Some(sample) = engine.step()? {
            record.t.push(sample.timestamp);
            record.y.push(engine.output());
            record.samples.push(sample);
        }
    }
    Ok(record)
}
