// pl-core/src/units.rs

use uom::si::f64::Angle as UomAngle;

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn to_degrees(a: Angle) -> f64 {
    use uom::si::angle::degree;
    a.get::<degree>()
}

pub mod constants {
    /// Gravitational acceleration used by the actuator load model (m/s²).
    pub const G_MPS2: f64 = 9.81;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_conversion() {
        let deg = to_degrees(rad(std::f64::consts::PI));
        assert!((deg - 180.0).abs() < 1e-9);
        assert!(to_degrees(rad(0.0)).abs() < 1e-12);
    }
}
