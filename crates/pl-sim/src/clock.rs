//! Simulation clock with a fixed telemetry cadence.
//!
//! Time advances in whole integration ticks. A sample becomes due every
//! `ticks_per_sample` ticks, so the output interval is always an exact
//! multiple of the step.

use crate::error::{SimError, SimResult};

/// Tick counter and emission schedule for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    dt: f64,
    ticks_per_sample: u64,
    tick: u64,
}

impl SimulationClock {
    /// Create a clock at t=0.
    ///
    /// `output_interval` is rounded to the nearest whole number of steps,
    /// with a minimum of one.
    pub fn new(dt: f64, output_interval: f64) -> SimResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "dt must be positive and finite",
            });
        }
        if !output_interval.is_finite() || output_interval <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "output interval must be positive and finite",
            });
        }
        let ticks_per_sample = (output_interval / dt).round().max(1.0) as u64;
        Ok(Self {
            dt,
            ticks_per_sample,
            tick: 0,
        })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Effective output interval after rounding.
    pub fn output_interval(&self) -> f64 {
        self.ticks_per_sample as f64 * self.dt
    }

    pub fn ticks_per_sample(&self) -> u64 {
        self.ticks_per_sample
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f64 {
        self.tick as f64 * self.dt
    }

    /// Record one completed integration step.
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// True when the tick just completed lands on the output cadence.
    pub fn should_emit(&self) -> bool {
        self.tick > 0 && self.tick % self.ticks_per_sample == 0
    }

    /// Restart at t=0.
    pub fn reset(&mut self) {
        self.tick = 0;
    }
}
