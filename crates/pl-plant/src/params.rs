//! Physical parameters of the actuator and pressure process.

use crate::error::{PlantError, PlantResult};
use pl_core::{constants::G_MPS2, ensure_positive};
use serde::{Deserialize, Serialize};

/// Physical constants of the motor, gearbox, valve and pressure line.
///
/// Defaults are the documented values of the reference actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantParams {
    /// Armature resistance (Ω).
    pub resistance_ohm: f64,
    /// Armature inductance (H).
    pub inductance_h: f64,
    /// Torque constant (N·m/A).
    pub torque_constant: f64,
    /// Back-EMF constant (V·s/rad).
    pub back_emf_constant: f64,
    /// Motor rotor inertia (kg·m²).
    pub motor_inertia: f64,
    /// Valve disc mass (kg).
    pub valve_mass_kg: f64,
    /// Valve disc radius (m).
    pub valve_radius_m: f64,
    /// Static friction torque at the valve (N·m). Reported only.
    pub friction_torque_nm: f64,
    /// Gearbox reduction ratio (motor turns per valve turn).
    pub gear_ratio: f64,
    /// Gearbox efficiency, in (0, 1].
    pub gear_efficiency: f64,
    /// Linearised pressure gain around the operating point (bar/rad of valve).
    pub pressure_gain: f64,
    /// Pressure line time constant (s).
    pub pressure_time_constant_s: f64,
    /// Pressure sensor gain (V/bar).
    pub sensor_gain: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            resistance_ohm: 1.2,
            inductance_h: 0.005,
            torque_constant: 0.8,
            back_emf_constant: 0.8,
            motor_inertia: 0.02,
            valve_mass_kg: 100.0,
            valve_radius_m: 0.35,
            friction_torque_nm: 120.0,
            gear_ratio: 40.0,
            gear_efficiency: 0.85,
            pressure_gain: 150.0,
            pressure_time_constant_s: 0.5,
            sensor_gain: 0.01,
        }
    }
}

impl PlantParams {
    /// Check that every constant is finite and strictly positive.
    pub fn validate(&self) -> PlantResult<()> {
        ensure_positive(self.resistance_ohm, "resistance_ohm must be positive")?;
        ensure_positive(self.inductance_h, "inductance_h must be positive")?;
        ensure_positive(self.torque_constant, "torque_constant must be positive")?;
        ensure_positive(self.back_emf_constant, "back_emf_constant must be positive")?;
        ensure_positive(self.motor_inertia, "motor_inertia must be positive")?;
        ensure_positive(self.valve_mass_kg, "valve_mass_kg must be positive")?;
        ensure_positive(self.valve_radius_m, "valve_radius_m must be positive")?;
        ensure_positive(self.gear_ratio, "gear_ratio must be positive")?;
        ensure_positive(self.gear_efficiency, "gear_efficiency must be positive")?;
        ensure_positive(self.pressure_gain, "pressure_gain must be positive")?;
        ensure_positive(
            self.pressure_time_constant_s,
            "pressure_time_constant_s must be positive",
        )?;
        ensure_positive(self.sensor_gain, "sensor_gain must be positive")?;

        if self.gear_efficiency > 1.0 {
            return Err(PlantError::Configuration {
                what: format!(
                    "gear_efficiency must not exceed 1 (got {})",
                    self.gear_efficiency
                ),
            });
        }
        if !self.friction_torque_nm.is_finite() || self.friction_torque_nm < 0.0 {
            return Err(PlantError::Configuration {
                what: format!(
                    "friction_torque_nm must be finite and non-negative (got {})",
                    self.friction_torque_nm
                ),
            });
        }
        Ok(())
    }

    /// Valve disc inertia, J = ½·m·r².
    pub fn valve_inertia(&self) -> f64 {
        0.5 * self.valve_mass_kg * self.valve_radius_m.powi(2)
    }

    /// Valve inertia reflected through the gearbox, J / (η·N²).
    pub fn reflected_inertia(&self) -> f64 {
        self.valve_inertia() / (self.gear_efficiency * self.gear_ratio.powi(2))
    }

    /// Total inertia seen at the motor shaft.
    pub fn total_inertia(&self) -> f64 {
        self.motor_inertia + self.reflected_inertia()
    }

    /// Gravity torque on the valve disc, m·g·r.
    pub fn gravity_torque(&self) -> f64 {
        self.valve_mass_kg * G_MPS2 * self.valve_radius_m
    }

    /// Gravity plus static friction torque at the valve.
    pub fn load_torque(&self) -> f64 {
        self.gravity_torque() + self.friction_torque_nm
    }
}
