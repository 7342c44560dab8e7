//! Planar affine transform.

use skygrid_core::Vector2;
use tracing::warn;

use crate::error::{WcsError, WcsResult};

/// Offset threshold below which a composed affine counts as the
/// identity.
const IDENTITY_TOLERANCE: f64 = 1e-10;

/// Six-parameter affine map of the plane:
/// `x' = x0 + a00·x + a01·y`, `y' = y0 + a10·x + a11·y`.
///
/// Used both for projection-plane to pixel-grid scalings and for
/// composed header matrices (CD / PC·CDELT).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
    x0: f64,
    y0: f64,
    a00: f64,
    a01: f64,
    a10: f64,
    a11: f64,
}

impl Scaler {
    pub const fn new(x0: f64, y0: f64, a00: f64, a01: f64, a10: f64, a11: f64) -> Self {
        Self {
            x0,
            y0,
            a00,
            a01,
            a10,
            a11,
        }
    }

    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn offset(&self) -> (f64, f64) {
        (self.x0, self.y0)
    }

    #[inline]
    pub fn matrix(&self) -> [f64; 4] {
        [self.a00, self.a01, self.a10, self.a11]
    }

    #[inline]
    pub fn apply(&self, p: Vector2) -> Vector2 {
        Vector2::new(
            self.x0 + self.a00 * p.x + self.a01 * p.y,
            self.y0 + self.a10 * p.x + self.a11 * p.y,
        )
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.a00 * self.a11 - self.a01 * self.a10
    }

    /// Geometric mean of the axis scalings, |det|^1/2. For a sky-to-
    /// pixel scaler this is the nominal pixels-per-radian scale.
    pub fn scale(&self) -> f64 {
        libm::sqrt(self.determinant().abs())
    }

    /// The inverse affine. A strictly zero determinant is an error; a
    /// merely tiny one (relative to the coefficient magnitude) is
    /// inverted anyway but logged, since it usually means a header
    /// with inconsistent units rather than a true degeneracy.
    pub fn inverse(&self) -> WcsResult<Scaler> {
        let det = self.determinant();
        if det == 0.0 {
            return Err(WcsError::not_invertible("affine determinant is zero"));
        }
        let norm = self.a00.abs() + self.a01.abs() + self.a10.abs() + self.a11.abs();
        if det.abs() < 1e-10 * norm * norm {
            warn!(det, norm, "inverting a nearly singular plane scaling");
        }
        let b00 = self.a11 / det;
        let b01 = -self.a01 / det;
        let b10 = -self.a10 / det;
        let b11 = self.a00 / det;
        Ok(Scaler::new(
            -(b00 * self.x0 + b01 * self.y0),
            -(b10 * self.x0 + b11 * self.y0),
            b00,
            b01,
            b10,
            b11,
        ))
    }

    /// Composition where `self` acts first and `after` second.
    pub fn add(&self, after: &Scaler) -> Scaler {
        Scaler::new(
            after.x0 + after.a00 * self.x0 + after.a01 * self.y0,
            after.y0 + after.a10 * self.x0 + after.a11 * self.y0,
            after.a00 * self.a00 + after.a01 * self.a10,
            after.a00 * self.a01 + after.a01 * self.a11,
            after.a10 * self.a00 + after.a11 * self.a10,
            after.a10 * self.a01 + after.a11 * self.a11,
        )
    }

    /// Swaps the roles of the two axes on both input and output, for
    /// headers that list the latitude axis first.
    pub fn interchange_axes(&mut self) {
        std::mem::swap(&mut self.x0, &mut self.y0);
        std::mem::swap(&mut self.a00, &mut self.a11);
        std::mem::swap(&mut self.a01, &mut self.a10);
    }

    /// True when composing with `other` yields the identity within
    /// tolerance.
    pub fn is_inverse_of(&self, other: &Scaler) -> bool {
        let c = self.add(other);
        c.x0.abs() < IDENTITY_TOLERANCE
            && c.y0.abs() < IDENTITY_TOLERANCE
            && (c.a00 - 1.0).abs() < IDENTITY_TOLERANCE
            && c.a01.abs() < IDENTITY_TOLERANCE
            && c.a10.abs() < IDENTITY_TOLERANCE
            && (c.a11 - 1.0).abs() < IDENTITY_TOLERANCE
    }
}

impl Default for Scaler {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector2, b: Vector2) -> bool {
        (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12
    }

    #[test]
    fn applies_offset_and_matrix() {
        let s = Scaler::new(10.0, 20.0, 2.0, 0.0, 0.0, -3.0);
        let p = s.apply(Vector2::new(1.0, 1.0));
        assert!(close(p, Vector2::new(12.0, 17.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let s = Scaler::new(5.0, -2.0, 1.5, 0.25, -0.75, 2.0);
        let inv = s.inverse().unwrap();
        let p = Vector2::new(3.25, -7.5);
        assert!(close(inv.apply(s.apply(p)), p));
        assert!(s.is_inverse_of(&inv));
    }

    #[test]
    fn singular_scaler_does_not_invert() {
        let s = Scaler::new(0.0, 0.0, 1.0, 2.0, 2.0, 4.0);
        assert!(matches!(s.inverse(), Err(WcsError::NotInvertible { .. })));
    }

    #[test]
    fn add_applies_argument_second() {
        let first = Scaler::new(1.0, 0.0, 2.0, 0.0, 0.0, 2.0);
        let second = Scaler::new(0.0, 5.0, 1.0, 0.0, 0.0, -1.0);
        let both = first.add(&second);
        let p = Vector2::new(1.0, 1.0);
        assert!(close(both.apply(p), second.apply(first.apply(p))));
    }

    #[test]
    fn interchange_swaps_axis_roles() {
        let mut s = Scaler::new(1.0, 2.0, 3.0, 0.0, 0.0, 4.0);
        s.interchange_axes();
        let p = s.apply(Vector2::new(1.0, 1.0));
        assert!(close(p, Vector2::new(2.0 + 4.0, 1.0 + 3.0)));
    }

    #[test]
    fn scale_is_geometric_mean() {
        let s = Scaler::new(0.0, 0.0, 2.0, 0.0, 0.0, 8.0);
        assert!((s.scale() - 4.0).abs() < 1e-14);
    }
}
