//! PID gain set.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proportional, integral and derivative gains; each finite and non-negative.
///
/// Serialized with the operator-facing keys `Kp`, `Ki`, `Kd`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerGains {
    #[serde(rename = "Kp")]
    pub kp: f64,
    #[serde(rename = "Ki")]
    pub ki: f64,
    #[serde(rename = "Kd")]
    pub kd: f64,
}

impl ControllerGains {
    /// Create a validated gain set.
    pub fn new(kp: f64, ki: f64, kd: f64) -> ControlResult<Self> {
        let gains = Self { kp, ki, kd };
        gains.validate()?;
        Ok(gains)
    }

    /// All gains zero (open loop with a free integrator).
    pub fn zero() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
        }
    }

    pub fn validate(&self) -> ControlResult<()> {
        for (name, value) in [("Kp", self.kp), ("Ki", self.ki), ("Kd", self.kd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ControlError::InvalidGains {
                    what: format!("{name} must be finite and non-negative (got {value})"),
                });
            }
        }
        Ok(())
    }
}

impl Default for ControllerGains {
    /// Reference tuning of the pressure loop.
    fn default() -> Self {
        Self {
            kp: 115.2,
            ki: 34.56,
            kd: 49.92,
        }
    }
}

impl fmt::Display for ControllerGains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kp={} Ki={} Kd={}", self.kp, self.ki, self.kd)
    }
}
