//! Schmidt-plate astrometric solution.
//!
//! Digitized sky survey plates ship AMDX/AMDY coefficient sets that
//! turn plate position in mm (relative to the plate center) into
//! standard coordinates in arcseconds. Terms 1-13 are the geometric
//! ones; the magnitude and color terms that follow need per-object
//! data a resampler does not have and are not applied.

use skygrid_core::constants::{ARCSEC_TO_RAD, RAD_TO_ARCSEC};
use skygrid_core::Vector2;

use super::newton_invert;

#[derive(Debug, Clone, PartialEq)]
pub struct PlateDistorter {
    amd_x: [f64; 13],
    amd_y: [f64; 13],
}

impl PlateDistorter {
    pub fn new(amd_x: [f64; 13], amd_y: [f64; 13]) -> Self {
        Self { amd_x, amd_y }
    }

    /// Plate mm to standard coordinates in radians.
    pub fn undo(&self, p: Vector2) -> Vector2 {
        if !p.is_finite() {
            return Vector2::nan();
        }
        let xi = poly(&self.amd_x, p.x, p.y);
        let eta = poly(&self.amd_y, p.y, p.x);
        Vector2::new(xi * ARCSEC_TO_RAD, eta * ARCSEC_TO_RAD)
    }

    /// Standard coordinates in radians to plate mm.
    pub fn apply(&self, p: Vector2) -> Vector2 {
        // The leading terms dominate; invert the linear part for the
        // starting guess.
        let a = [self.amd_x[0], self.amd_x[1], self.amd_y[1], self.amd_y[0]];
        let det = a[0] * a[3] - a[1] * a[2];
        let guess = if det != 0.0 {
            let xi = p.x * RAD_TO_ARCSEC - self.amd_x[2];
            let eta = p.y * RAD_TO_ARCSEC - self.amd_y[2];
            Vector2::new(
                (a[3] * xi - a[1] * eta) / det,
                (-a[2] * xi + a[0] * eta) / det,
            )
        } else {
            Vector2::new(0.0, 0.0)
        };
        newton_invert(|q| self.undo(q), p, guess)
    }
}

/// The 13-term plate polynomial; `u` is the leading axis, `v` the
/// other. The y solution uses the same form with the axes swapped.
fn poly(c: &[f64; 13], u: f64, v: f64) -> f64 {
    let u2 = u * u;
    let v2 = v * v;
    let r2 = u2 + v2;
    c[0] * u
        + c[1] * v
        + c[2]
        + c[3] * u2
        + c[4] * u * v
        + c[5] * v2
        + c[6] * r2
        + c[7] * u2 * u
        + c[8] * u2 * v
        + c[9] * u * v2
        + c[10] * v2 * v
        + c[11] * u * r2
        + c[12] * u * r2 * r2
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Coefficients shaped like a real plate solution: ~67''/mm scale
    /// with small cross, quadratic and cubic terms.
    fn sample_plate() -> PlateDistorter {
        let mut ax = [0.0; 13];
        let mut ay = [0.0; 13];
        ax[0] = 67.18;
        ax[1] = 0.31;
        ax[2] = -0.92;
        ax[3] = 2.1e-4;
        ax[6] = -1.3e-4;
        ax[11] = 1.9e-6;
        ay[0] = 67.21;
        ay[1] = -0.28;
        ay[2] = 1.15;
        ay[3] = -1.7e-4;
        ay[6] = 2.2e-4;
        ay[11] = 2.1e-6;
        PlateDistorter::new(ax, ay)
    }

    #[test]
    fn undo_scale_is_plate_scale() {
        let d = sample_plate();
        let p = d.undo(Vector2::new(1.0, 0.0));
        // One mm is about 67 arcsec for this plate.
        assert!((p.x * RAD_TO_ARCSEC - (67.18 - 0.92 + 2.1e-4 - 1.3e-4 + 1.9e-6)).abs() < 1e-9);
    }

    #[test]
    fn apply_round_trips_across_the_plate() {
        let d = sample_plate();
        for (x, y) in [(0.0, 0.0), (120.0, -85.0), (-160.0, 140.0), (3.2, 0.7)] {
            let mm = Vector2::new(x, y);
            let std = d.undo(mm);
            let back = d.apply(std);
            assert!(
                (back - mm).magnitude() < 1e-8,
                "({x}, {y}) -> {back:?}"
            );
        }
    }

    #[test]
    fn apply_rejects_nan() {
        let d = sample_plate();
        assert!(!d.apply(Vector2::nan()).is_finite());
    }
}
