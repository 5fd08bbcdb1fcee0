//! Projection of the augmented state into telemetry samples.
//!
//! Clamping here is display-only. The integrated state is never clipped.

use crate::error::{SimError, SimResult};
use nalgebra::DVector;
use pl_control::ClosedLoopSystem;
use pl_core::{rad, to_degrees};
use pl_plant::layout;
use serde::{Deserialize, Serialize};

/// One telemetry record, serialized as a single JSON object per line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Tank pressure in bar.
    pub pressure: f64,
    /// Valve opening in degrees.
    pub valve_angle: f64,
    /// Motor current in amperes.
    pub motor_current: f64,
    /// Pressure setpoint in bar.
    pub setpoint: f64,
    /// Simulated time in seconds.
    pub timestamp: f64,
}

/// Display ranges applied to emitted samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayLimits {
    pub pressure_max: f64,
    pub valve_angle_max_deg: f64,
    pub current_max: f64,
}

impl DisplayLimits {
    /// Every bound must be positive and finite.
    pub fn validate(&self) -> SimResult<()> {
        let bounds = [self.pressure_max, self.valve_angle_max_deg, self.current_max];
        if bounds.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(SimError::InvalidArg {
                what: "display limits must be positive and finite",
            });
        }
        Ok(())
    }
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            pressure_max: 700.0,
            valve_angle_max_deg: 180.0,
            current_max: 25.0,
        }
    }
}

/// Maps a closed-loop state to a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleProjection {
    gear_ratio: f64,
    limits: DisplayLimits,
}

impl SampleProjection {
    pub fn new(gear_ratio: f64, limits: DisplayLimits) -> SimResult<Self> {
        if !gear_ratio.is_finite() || gear_ratio <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "gear ratio must be positive and finite",
            });
        }
        limits.validate()?;
        Ok(Self { gear_ratio, limits })
    }

    pub fn limits(&self) -> DisplayLimits {
        self.limits
    }

    pub fn project(
        &self,
        system: &ClosedLoopSystem,
        x: &DVector<f64>,
        setpoint: f64,
        timestamp: f64,
    ) -> Sample {
        let component = |i: usize| x.get(i).copied().unwrap_or(0.0);
        let valve_rad = component(layout::POSITION) / self.gear_ratio;

        Sample {
            pressure: clamp(system.output(x), self.limits.pressure_max),
            valve_angle: clamp(to_degrees(rad(valve_rad)), self.limits.valve_angle_max_deg),
            motor_current: clamp(component(layout::CURRENT), self.limits.current_max),
            setpoint,
            timestamp,
        }
    }
}

fn clamp(v: f64, max: f64) -> f64 {
    v.clamp(0.0, max)
}
