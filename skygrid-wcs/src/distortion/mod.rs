//! Plane distortions that sit between a projection and its pixel
//! scaling.
//!
//! Each distorter is defined by its `undo` direction, the published
//! polynomial from distorted plane coordinates back to true standard
//! coordinates; the `apply` direction inverts it numerically with a
//! damped Newton iteration. Per-point non-convergence yields NaN.

mod plate;

pub use plate::PlateDistorter;

use skygrid_core::Vector2;

#[derive(Debug, Clone, PartialEq)]
pub enum Distorter {
    /// Schmidt-plate astrometric solution (AMD coefficients).
    Plate(PlateDistorter),
    /// Fixed-pattern quadratic distortion of scanned-image headers.
    Scan(ScanDistorter),
}

impl Distorter {
    /// True standard coordinates to distorted plane coordinates (the
    /// sky-to-pixel direction).
    pub fn apply(&self, p: Vector2) -> Vector2 {
        match self {
            Self::Plate(d) => d.apply(p),
            Self::Scan(d) => d.apply(p),
        }
    }

    /// Distorted plane coordinates to true standard coordinates.
    pub fn undo(&self, p: Vector2) -> Vector2 {
        match self {
            Self::Plate(d) => d.undo(p),
            Self::Scan(d) => d.undo(p),
        }
    }
}

/// Quadratic fixed-pattern distortion: the scanned plane carries a
/// position-dependent quadratic offset relative to the true
/// projection plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanDistorter {
    /// Coefficients of x², xy, y² in the x correction.
    pub cx: [f64; 3],
    /// Coefficients of x², xy, y² in the y correction.
    pub cy: [f64; 3],
}

impl ScanDistorter {
    pub fn new(cx: [f64; 3], cy: [f64; 3]) -> Self {
        Self { cx, cy }
    }

    pub fn undo(&self, p: Vector2) -> Vector2 {
        let (x, y) = (p.x, p.y);
        Vector2::new(
            x + self.cx[0] * x * x + self.cx[1] * x * y + self.cx[2] * y * y,
            y + self.cy[0] * x * x + self.cy[1] * x * y + self.cy[2] * y * y,
        )
    }

    pub fn apply(&self, p: Vector2) -> Vector2 {
        newton_invert(|q| self.undo(q), p, p)
    }
}

const NEWTON_ITERATIONS: usize = 20;
const NEWTON_TOLERANCE: f64 = 1e-13;

/// Solves f(q) = target by Newton iteration with a finite-difference
/// Jacobian, starting from `guess`. NaN on non-convergence.
pub(crate) fn newton_invert(
    f: impl Fn(Vector2) -> Vector2,
    target: Vector2,
    guess: Vector2,
) -> Vector2 {
    if !target.is_finite() || !guess.is_finite() {
        return Vector2::nan();
    }
    let mut q = guess;
    for _ in 0..NEWTON_ITERATIONS {
        let r = f(q) - target;
        if r.x.abs() < NEWTON_TOLERANCE && r.y.abs() < NEWTON_TOLERANCE {
            return q;
        }
        let hx = 1e-7 * q.x.abs().max(1.0);
        let hy = 1e-7 * q.y.abs().max(1.0);
        let fx = f(Vector2::new(q.x + hx, q.y)) - f(Vector2::new(q.x - hx, q.y));
        let fy = f(Vector2::new(q.x, q.y + hy)) - f(Vector2::new(q.x, q.y - hy));
        let j00 = fx.x / (2.0 * hx);
        let j10 = fx.y / (2.0 * hx);
        let j01 = fy.x / (2.0 * hy);
        let j11 = fy.y / (2.0 * hy);
        let det = j00 * j11 - j01 * j10;
        if det == 0.0 || !det.is_finite() {
            return Vector2::nan();
        }
        q = Vector2::new(
            q.x - (j11 * r.x - j01 * r.y) / det,
            q.y - (-j10 * r.x + j00 * r.y) / det,
        );
        if !q.is_finite() {
            return Vector2::nan();
        }
    }
    let r = f(q) - target;
    if r.x.abs() < 1e-9 && r.y.abs() < 1e-9 {
        q
    } else {
        Vector2::nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_round_trips() {
        let d = ScanDistorter::new([1e-4, -2e-4, 5e-5], [3e-5, 1e-4, -1e-4]);
        let p = Vector2::new(0.02, -0.015);
        let back = d.undo(d.apply(p));
        assert!((back - p).magnitude() < 1e-12);
    }

    #[test]
    fn zero_scan_is_identity() {
        let d = ScanDistorter::default();
        let p = Vector2::new(0.5, -0.25);
        assert_eq!(d.undo(p), p);
        let q = d.apply(p);
        assert!((q - p).magnitude() < 1e-12);
    }

    #[test]
    fn newton_inverts_a_nonlinear_map() {
        let f = |p: Vector2| Vector2::new(p.x + 0.01 * p.y * p.y, p.y - 0.02 * p.x * p.x);
        let target = Vector2::new(1.3, -0.8);
        let q = newton_invert(f, target, target);
        let r = f(q) - target;
        assert!(r.x.abs() < 1e-12 && r.y.abs() < 1e-12);
    }

    #[test]
    fn newton_propagates_nan() {
        let f = |p: Vector2| p;
        assert!(!newton_invert(f, Vector2::nan(), Vector2::new(0.0, 0.0)).is_finite());
    }
}
