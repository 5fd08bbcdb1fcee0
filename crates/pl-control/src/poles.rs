//! Closed-loop pole analysis.

use crate::closed_loop::ClosedLoopSystem;
use crate::error::{ControlError, ControlResult};
use nalgebra::Complex;
use nalgebra::linalg::Schur;

const MAX_SCHUR_ITERATIONS: usize = 10_000;

/// Slowest closed-loop pole and its second-order characteristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantPole {
    pub pole: Complex<f64>,
    /// |s| (rad/s).
    pub natural_frequency: f64,
    /// −Re(s)/|s|; zero for a pole at the origin.
    pub damping_ratio: f64,
}

/// Eigenvalues of `A_cl` and derived stability figures.
#[derive(Debug, Clone, PartialEq)]
pub struct PoleReport {
    /// Poles sorted by real part, most negative first.
    pub poles: Vec<Complex<f64>>,
    /// Largest real part.
    pub spectral_abscissa: f64,
    /// Every pole strictly in the left half-plane.
    pub stable: bool,
    pub dominant: DominantPole,
}

/// Compute the closed-loop poles via a real Schur decomposition.
pub fn analyze(system: &ClosedLoopSystem) -> ControlResult<PoleReport> {
    let schur = Schur::try_new(system.a_cl().clone(), f64::EPSILON, MAX_SCHUR_ITERATIONS)
        .ok_or(ControlError::PoleAnalysis {
            what: "Schur iteration did not converge",
        })?;

    let mut poles: Vec<Complex<f64>> = schur.complex_eigenvalues().iter().copied().collect();
    if poles.iter().any(|p| !p.re.is_finite() || !p.im.is_finite()) {
        return Err(ControlError::PoleAnalysis {
            what: "non-finite eigenvalue",
        });
    }
    poles.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));

    let dominant_pole = *poles.last().ok_or(ControlError::PoleAnalysis {
        what: "empty system matrix",
    })?;
    let spectral_abscissa = dominant_pole.re;

    let natural_frequency = dominant_pole.norm();
    let damping_ratio = if natural_frequency > 0.0 {
        -dominant_pole.re / natural_frequency
    } else {
        0.0
    };

    Ok(PoleReport {
        poles,
        spectral_abscissa,
        stable: spectral_abscissa < 0.0,
        dominant: DominantPole {
            pole: dominant_pole,
            natural_frequency,
            damping_ratio,
        },
    })
}
