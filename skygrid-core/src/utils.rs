//! Small angle-bookkeeping helpers.

use crate::constants::{PI, TWO_PI};

/// Wraps an angle in radians into (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % TWO_PI;
    if a <= -PI {
        a += TWO_PI;
    } else if a > PI {
        a -= TWO_PI;
    }
    a
}

/// Wraps an angle in radians into [0, 2π).
pub fn normalize_positive(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % TWO_PI;
    if a < 0.0 {
        a += TWO_PI;
    }
    a
}

/// Wraps degrees into [0, 360); header-boundary counterpart of
/// [`normalize_positive`].
pub fn normalize_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_into_signed_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-14);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-14);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn wraps_into_positive_range() {
        assert!((normalize_positive(-0.25) - (TWO_PI - 0.25)).abs() < 1e-14);
        assert!(normalize_positive(TWO_PI) < 1e-14);
    }

    #[test]
    fn degrees_wrap() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.5), 0.5);
    }

    #[test]
    fn non_finite_passes_through() {
        assert!(normalize_angle(f64::NAN).is_nan());
        assert!(normalize_positive(f64::INFINITY).is_infinite());
    }
}
