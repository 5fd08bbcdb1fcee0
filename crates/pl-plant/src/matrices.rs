//! Frozen state-space matrices of the open-loop plant.
//!
//! ```text
//! A = [ -R/L        -Ke/L   0             0     ]
//!     [ Kt/J_total   0      0             0     ]
//!     [ 0            1      0             0     ]
//!     [ 0            0      Kp/(N·τp)    -1/τp  ]
//! B = [1/L, 0, 0, 0]ᵀ    C = [0, 0, 0, Ks]    D = 0
//! ```

use crate::error::{PlantError, PlantResult};
use crate::params::PlantParams;
use nalgebra::{DMatrix, DVector, RowDVector};

/// Indices of the physical states in the plant state vector.
pub mod layout {
    /// Armature current (A).
    pub const CURRENT: usize = 0;
    /// Motor angular velocity (rad/s).
    pub const VELOCITY: usize = 1;
    /// Motor angular position (rad).
    pub const POSITION: usize = 2;
    /// Line pressure (bar).
    pub const PRESSURE: usize = 3;
    /// Number of plant states.
    pub const ORDER: usize = 4;
}

/// Linear plant `ẋ = A·x + B·u`, `y = C·x + D·u`, with a single measured state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantMatrices {
    a: DMatrix<f64>,
    b: DVector<f64>,
    c: RowDVector<f64>,
    d: f64,
    measured: usize,
}

impl PlantMatrices {
    /// Build from raw matrices.
    ///
    /// `c` must select exactly one state (one non-zero entry); that entry is
    /// the sensor gain of the measured output.
    pub fn new(
        a: DMatrix<f64>,
        b: DVector<f64>,
        c: RowDVector<f64>,
        d: f64,
    ) -> PlantResult<Self> {
        let n = a.nrows();
        if n == 0 || a.ncols() != n {
            return Err(PlantError::Configuration {
                what: format!("A must be square and non-empty (got {}x{})", n, a.ncols()),
            });
        }
        if b.len() != n {
            return Err(PlantError::Configuration {
                what: format!("B must have {} rows (got {})", n, b.len()),
            });
        }
        if c.len() != n {
            return Err(PlantError::Configuration {
                what: format!("C must have {} columns (got {})", n, c.len()),
            });
        }
        let all_finite = a.iter().chain(b.iter()).chain(c.iter()).all(|v| v.is_finite());
        if !all_finite || !d.is_finite() {
            return Err(PlantError::Configuration {
                what: "plant matrices contain non-finite entries".to_string(),
            });
        }

        let selected: Vec<usize> = c
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, _)| i)
            .collect();
        let measured = match selected.as_slice() {
            [only] => *only,
            _ => {
                return Err(PlantError::Configuration {
                    what: format!(
                        "C must select exactly one measured state ({} non-zero entries)",
                        selected.len()
                    ),
                });
            }
        };

        Ok(Self {
            a,
            b,
            c,
            d,
            measured,
        })
    }

    /// Build the actuator/pressure plant from validated physical parameters.
    pub fn from_params(p: &PlantParams) -> PlantResult<Self> {
        p.validate()?;

        let j_total = p.total_inertia();
        let n = layout::ORDER;

        let mut a = DMatrix::zeros(n, n);
        a[(layout::CURRENT, layout::CURRENT)] = -p.resistance_ohm / p.inductance_h;
        a[(layout::CURRENT, layout::VELOCITY)] = -p.back_emf_constant / p.inductance_h;
        a[(layout::VELOCITY, layout::CURRENT)] = p.torque_constant / j_total;
        a[(layout::POSITION, layout::VELOCITY)] = 1.0;
        a[(layout::PRESSURE, layout::POSITION)] =
            p.pressure_gain / (p.gear_ratio * p.pressure_time_constant_s);
        a[(layout::PRESSURE, layout::PRESSURE)] = -1.0 / p.pressure_time_constant_s;

        let mut b = DVector::zeros(n);
        b[layout::CURRENT] = 1.0 / p.inductance_h;

        let mut c = RowDVector::zeros(n);
        c[layout::PRESSURE] = p.sensor_gain;

        Self::new(a, b, c, 0.0)
    }

    /// Number of plant states.
    pub fn order(&self) -> usize {
        self.a.nrows()
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn c(&self) -> &RowDVector<f64> {
        &self.c
    }

    pub fn d(&self) -> f64 {
        self.d
    }

    /// Index of the state picked out by `C`.
    pub fn measured_index(&self) -> usize {
        self.measured
    }

    /// Gain between the measured state and the output signal.
    pub fn sensor_gain(&self) -> f64 {
        self.c[self.measured]
    }

    /// State derivative `f(x, u) = A·x + B·u`.
    pub fn derivative(&self, x: &DVector<f64>, u: f64) -> DVector<f64> {
        &self.a * x + &self.b * u
    }

    /// Output `g(x) = C·x`.
    pub fn output(&self, x: &DVector<f64>) -> f64 {
        self.c.dot(&x.transpose())
    }
}
