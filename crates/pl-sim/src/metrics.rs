//! Step-response metrics computed from a recorded pressure series.

use crate::error::{SimError, SimResult};

/// Summary of a setpoint step response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    /// 10% to 90% rise time, if both crossings occur.
    pub rise_time: Option<f64>,
    /// Peak overshoot as a percentage of the setpoint.
    pub overshoot_percent: f64,
    /// Time after which the response stays inside the band, if it settles.
    pub settling_time: Option<f64>,
    /// Mean `setpoint - y` over the final 10% of samples.
    pub steady_state_error: f64,
}

impl StepMetrics {
    /// Compute metrics for a response starting from zero.
    ///
    /// `band` is the relative settling band (0.01 for ±1%).
    pub fn from_series(t: &[f64], y: &[f64], setpoint: f64, band: f64) -> SimResult<Self> {
        if t.is_empty() || t.len() != y.len() {
            return Err(SimError::InvalidSeries {
                what: "time and value series must be non-empty and equal length",
            });
        }
        if setpoint == 0.0 || !setpoint.is_finite() {
            return Err(SimError::InvalidSeries {
                what: "setpoint must be finite and nonzero",
            });
        }
        if !band.is_finite() || band <= 0.0 {
            return Err(SimError::InvalidSeries {
                what: "settling band must be positive",
            });
        }

        let first_reaching = |level: f64| {
            y.iter()
                .position(|&v| v >= level * setpoint)
                .map(|i| t[i])
        };
        let rise_time = match (first_reaching(0.1), first_reaching(0.9)) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        };

        let peak = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let overshoot_percent = ((peak - setpoint) / setpoint * 100.0).max(0.0);

        let tol = band * setpoint.abs();
        let settling_time = match y.iter().rposition(|&v| (v - setpoint).abs() > tol) {
            None => Some(t[0]),
            Some(i) if i + 1 < t.len() => Some(t[i + 1]),
            Some(_) => None,
        };

        let tail = (y.len() / 10).max(1);
        let steady_state_error =
            y[y.len() - tail..].iter().map(|v| setpoint - v).sum::<f64>() / tail as f64;

        Ok(Self {
            rise_time,
            overshoot_percent,
            settling_time,
            steady_state_error,
        })
    }
}
