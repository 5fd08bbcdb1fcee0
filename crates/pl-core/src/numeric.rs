use crate::{CoreError, CoreResult};
use nalgebra::DVector;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Strictly positive and finite, the usual requirement for a physical constant.
pub fn ensure_positive(v: Real, what: &'static str) -> CoreResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::InvalidArg { what })
    }
}

/// First non-finite entry of a vector, if any.
pub fn first_non_finite(x: &DVector<Real>) -> Option<(usize, Real)> {
    x.iter().copied().enumerate().find(|(_, v)| !v.is_finite())
}

/// Infinity norm; NaN entries propagate as NaN.
pub fn inf_norm(x: &DVector<Real>) -> Real {
    x.iter().fold(0.0, |acc: Real, v| {
        if v.is_nan() || acc.is_nan() {
            Real::NAN
        } else {
            acc.max(v.abs())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(0.0, "r").is_err());
        assert!(ensure_positive(-1.0, "r").is_err());
        assert!(ensure_positive(Real::INFINITY, "r").is_err());
        assert_eq!(ensure_positive(2.5, "r").unwrap(), 2.5);
    }

    #[test]
    fn inf_norm_and_non_finite_scan() {
        let x = DVector::from_vec(vec![1.0, -4.0, 2.0]);
        assert_eq!(inf_norm(&x), 4.0);
        assert!(first_non_finite(&x).is_none());

        let y = DVector::from_vec(vec![1.0, Real::NAN, 2.0]);
        assert!(inf_norm(&y).is_nan());
        assert_eq!(first_non_finite(&y).map(|(i, _)| i), Some(1));
    }
}
