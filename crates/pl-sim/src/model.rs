//! TransientModel trait and the closed-loop model it integrates.

use crate::error::SimResult;
use nalgebra::DVector;
use pl_control::ClosedLoopSystem;

/// Trait for transient (dynamic) system models.
///
/// A TransientModel must implement:
/// - State type (Clone, for snapshots)
/// - Initial state
/// - RHS (right-hand side) computation: x_dot = f(t, x)
/// - Scalar field arithmetic for integration: add states, scale by scalar
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Return the initial state at t=0.
    fn initial_state(&self) -> Self::State;

    /// Compute state derivative dxdt = f(t, x).
    fn rhs(&self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}

/// Autonomous closed loop `ẋ = A_cl·x + B_ref·r` with a constant setpoint.
#[derive(Clone, Copy, Debug)]
pub struct ClosedLoopModel<'a> {
    pub system: &'a ClosedLoopSystem,
    pub setpoint: f64,
}

impl TransientModel for ClosedLoopModel<'_> {
    type State = DVector<f64>;

    fn initial_state(&self) -> Self::State {
        DVector::zeros(self.system.order())
    }

    fn rhs(&self, _t: f64, x: &Self::State) -> SimResult<Self::State> {
        Ok(self.system.derivative(x, self.setpoint))
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a + b
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a * scale
    }
}
