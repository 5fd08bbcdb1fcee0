//! Fixed-step time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;
use serde::{Deserialize, Serialize};

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // Combine: x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Forward Euler (explicit, 1st order).
///
/// Its stability limit is tighter than RK4's: the reference loop's fastest
/// pole (≈ −216 s⁻¹) needs dt below ≈ 9 ms.
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorType {
    /// 4th-order Runge-Kutta (default, 4 rhs calls per step).
    #[default]
    #[serde(rename = "rk4")]
    RK4,
    /// Forward Euler (1st-order, 1 rhs call per step).
    #[serde(rename = "forward_euler")]
    ForwardEuler,
}

impl IntegratorType {
    pub fn step<M: TransientModel>(
        self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        match self {
            IntegratorType::RK4 => RK4.step(model, t, x, dt),
            IntegratorType::ForwardEuler => ForwardEuler.step(model, t, x, dt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ẋ = −x, exact solution e^(−t).
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }
    }

    fn integrate(kind: IntegratorType, dt: f64, steps: usize) -> f64 {
        let model = Decay;
        let mut x = model.initial_state();
        for i in 0..steps {
            x = kind.step(&model, i as f64 * dt, &x, dt).unwrap();
        }
        x
    }

    #[test]
    fn rk4_is_fourth_order_accurate() {
        let x = integrate(IntegratorType::RK4, 0.1, 10);
        assert!((x - (-1.0f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn forward_euler_converges_slowly() {
        let x = integrate(IntegratorType::ForwardEuler, 0.001, 1000);
        assert!((x - (-1.0f64).exp()).abs() < 1e-3);
        assert!((x - (-1.0f64).exp()).abs() > 1e-6);
    }

    #[test]
    fn integrators_are_deterministic() {
        let a = integrate(IntegratorType::RK4, 0.01, 500);
        let b = integrate(IntegratorType::RK4, 0.01, 500);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn integrator_names_in_config() {
        let kind: IntegratorType = serde_json::from_str("\"forward_euler\"").unwrap();
        assert_eq!(kind, IntegratorType::ForwardEuler);
        assert_eq!(serde_json::to_string(&IntegratorType::RK4).unwrap(), "\"rk4\"");
    }
}
