//! Augmented closed-loop realization of plant + PID.
//!
//! Augmented state `x_aug = [x_plant; z]` where `z = ∫(r − y_m)·dt` is the
//! integral of the error in measured units (for the pressure plant, bar·s).
//!
//! The controller acts on the sensor signal. With `C·A` the measured-output
//! dynamics row and `C·B` its input coupling, the PID law
//!
//! ```text
//! u = Kp·Ks·(r − y_m) + Ki·Ks·z − Kd·(C·A·x + C·B·u)
//! ```
//!
//! contains `u` on both sides. Solving for `u` gives
//!
//! ```text
//! u = (F·x + Ki·Ks·z + Kp·Ks·r) / (1 + Kd·C·B),   F = −Kd·C·A − Kp·Ks·e_m
//! ```

use crate::error::{ControlError, ControlResult};
use crate::gains::ControllerGains;
use nalgebra::{DMatrix, DVector, RowDVector};
use pl_plant::PlantMatrices;

/// Below this magnitude the loop-closure denominator `1 + Kd·C·B` is treated
/// as zero. `C` carries the sensor gain, so the derivative term is closed in
/// sensor units: the denominator is `1 + Kd·Ks·B[m]`, not `1 + Kd·B[m]`.
pub const SINGULARITY_TOL: f64 = 1e-9;

/// Closed-loop matrices for one gain set. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedLoopSystem {
    a_cl: DMatrix<f64>,
    b_ref: DVector<f64>,
    c_cl: RowDVector<f64>,
    k_feedback: RowDVector<f64>,
    k_integral: f64,
    k_ref: f64,
    gains: ControllerGains,
    measured: usize,
}

impl ClosedLoopSystem {
    /// Fold `gains` into `plant`.
    ///
    /// Pure function of its inputs. Fails with
    /// [`ControlError::StructuralSingularity`] when `|1 + Kd·C·B|` (sensor
    /// units, `C·B = Ks·B[m]`) is below [`SINGULARITY_TOL`].
    pub fn build(plant: &PlantMatrices, gains: ControllerGains) -> ControlResult<Self> {
        gains.validate()?;

        let n = plant.order();
        let m = plant.measured_index();
        let ks = plant.sensor_gain();
        let a = plant.a();
        let b = plant.b();
        let c = plant.c();

        let row_y: RowDVector<f64> = c * a;
        let b_y = (c * b)[(0, 0)];

        let denom = 1.0 + gains.kd * b_y;
        if !denom.is_finite() || denom.abs() < SINGULARITY_TOL {
            return Err(ControlError::StructuralSingularity { gains, denom });
        }

        let mut f = row_y * (-gains.kd);
        f[m] -= gains.kp * ks;

        let k_feedback = f / denom;
        let k_integral = gains.ki * ks / denom;
        let k_ref = gains.kp * ks / denom;

        let mut a_cl = DMatrix::zeros(n + 1, n + 1);
        a_cl.view_mut((0, 0), (n, n))
            .copy_from(&(a + b * &k_feedback));
        a_cl.view_mut((0, n), (n, 1)).copy_from(&(b * k_integral));
        // ż = r − y_m; the setpoint enters through B_ref only.
        a_cl[(n, m)] = -1.0;

        let mut b_ref = DVector::zeros(n + 1);
        b_ref.rows_mut(0, n).copy_from(&(b * k_ref));
        b_ref[n] = 1.0;

        let mut c_cl = RowDVector::zeros(n + 1);
        c_cl[m] = 1.0;

        Ok(Self {
            a_cl,
            b_ref,
            c_cl,
            k_feedback,
            k_integral,
            k_ref,
            gains,
            measured: m,
        })
    }

    pub fn a_cl(&self) -> &DMatrix<f64> {
        &self.a_cl
    }

    pub fn b_ref(&self) -> &DVector<f64> {
        &self.b_ref
    }

    pub fn c_cl(&self) -> &RowDVector<f64> {
        &self.c_cl
    }

    pub fn gains(&self) -> ControllerGains {
        self.gains
    }

    /// Dimension of the augmented state (plant order + 1).
    pub fn order(&self) -> usize {
        self.a_cl.nrows()
    }

    /// Index of the integral-of-error coordinate.
    pub fn integral_index(&self) -> usize {
        self.order() - 1
    }

    /// Index of the measured plant state.
    pub fn measured_index(&self) -> usize {
        self.measured
    }

    /// `ẋ_aug = A_cl·x_aug + B_ref·r`.
    pub fn derivative(&self, x: &DVector<f64>, setpoint: f64) -> DVector<f64> {
        &self.a_cl * x + &self.b_ref * setpoint
    }

    /// Measured output `C_cl·x_aug`.
    pub fn output(&self, x: &DVector<f64>) -> f64 {
        (&self.c_cl * x)[(0, 0)]
    }

    /// Control input the loop applies to the plant at `x` (motor voltage).
    pub fn control_input(&self, x: &DVector<f64>, setpoint: f64) -> f64 {
        let feedback: f64 = self
            .k_feedback
            .iter()
            .zip(x.iter())
            .map(|(k, v)| k * v)
            .sum();
        feedback + self.k_integral * x[self.integral_index()] + self.k_ref * setpoint
    }
}
