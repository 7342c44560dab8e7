//! Numeric constants shared across the workspace.
//!
//! Angles are radians everywhere inside the library; degrees and
//! arcseconds appear only at header boundaries.

/// Archimedes' constant.
pub const PI: f64 = std::f64::consts::PI;

/// 2π.
pub const TWO_PI: f64 = 2.0 * PI;

/// π/2.
pub const HALF_PI: f64 = PI / 2.0;

/// π/4.
pub const QUARTER_PI: f64 = PI / 4.0;

/// Degrees to radians.
pub const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees.
pub const RAD_TO_DEG: f64 = 180.0 / PI;

/// Arcseconds to radians.
pub const ARCSEC_TO_RAD: f64 = DEG_TO_RAD / 3600.0;

/// Radians to arcseconds.
pub const RAD_TO_ARCSEC: f64 = 3600.0 * RAD_TO_DEG;

/// Hours of right ascension to degrees.
pub const HOUR_TO_DEG: f64 = 15.0;

/// Days per Julian year.
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// Days per Julian century.
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

/// Days per tropical (Besselian) year.
pub const DAYS_PER_TROPICAL_YEAR: f64 = 365.242198781;

/// Julian date of the J2000.0 epoch (2000 January 1.5 TT).
pub const J2000_JD: f64 = 2451545.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_conversions() {
        assert!((DEG_TO_RAD * RAD_TO_DEG - 1.0).abs() < 1e-15);
        assert!((ARCSEC_TO_RAD * RAD_TO_ARCSEC - 1.0).abs() < 1e-15);
    }

    #[test]
    fn arcsecond_magnitude() {
        // One arcsecond is about 4.85 microradians.
        assert!((ARCSEC_TO_RAD - 4.84813681109536e-6).abs() < 1e-18);
    }
}
