//! Sphere-to-sphere rotation transform.

use std::sync::OnceLock;

use skygrid_core::{Matrix3, Vector3};

use crate::error::{WcsError, WcsResult};

/// L1 deviation from the identity below which a rotation is treated
/// as exact, absorbing composition roundoff.
pub const IDENTITY_TOLERANCE: f64 = 1e-10;

/// Rotation of celestial unit vectors, built from Euler angles or a
/// ready matrix. Immutable once constructed; the transpose (which is
/// the inverse) is computed on first use and cached.
#[derive(Debug, Clone, Default)]
pub struct Rotater {
    matrix: Matrix3,
    transpose: OnceLock<Matrix3>,
}

impl Rotater {
    /// Builds a rotation from up to three Euler angles in radians.
    ///
    /// `axes` names the rotation axes in application order, e.g.
    /// `"ZYZ"` applies a z-rotation by `e1` first, then y by `e2`,
    /// then z by `e3`. Shorter strings use only the leading angles.
    pub fn new(axes: &str, e1: f64, e2: f64, e3: f64) -> WcsResult<Self> {
        if axes.is_empty() || axes.len() > 3 {
            return Err(WcsError::invalid_geometry(format!(
                "Euler axis string must name 1-3 axes, got {axes:?}"
            )));
        }
        let angles = [e1, e2, e3];
        let mut matrix = Matrix3::identity();
        for (axis, &angle) in axes.chars().zip(angles.iter()) {
            match axis.to_ascii_uppercase() {
                'X' => matrix.rotate_x(angle),
                'Y' => matrix.rotate_y(angle),
                'Z' => matrix.rotate_z(angle),
                other => {
                    return Err(WcsError::invalid_geometry(format!(
                        "unknown Euler axis {other:?} in {axes:?}"
                    )))
                }
            }
        }
        Ok(Self::from_matrix(matrix))
    }

    pub fn from_matrix(matrix: Matrix3) -> Self {
        Self {
            matrix,
            transpose: OnceLock::new(),
        }
    }

    pub fn identity() -> Self {
        Self::from_matrix(Matrix3::identity())
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix3 {
        &self.matrix
    }

    #[inline]
    pub fn apply(&self, v: &Vector3) -> Vector3 {
        self.matrix.apply(v)
    }

    /// Composition where `self` acts first and `after` second.
    pub fn add(&self, after: &Rotater) -> Rotater {
        Rotater::from_matrix(after.matrix.multiply(&self.matrix))
    }

    /// The inverse rotation. Always exists: a rotation matrix inverts
    /// by transposition.
    pub fn inverse(&self) -> Rotater {
        Rotater::from_matrix(*self.transposed())
    }

    pub fn is_identity(&self) -> bool {
        self.matrix.identity_deviation() < IDENTITY_TOLERANCE
    }

    /// True when composing with `other` yields the identity to within
    /// [`IDENTITY_TOLERANCE`].
    pub fn is_inverse_of(&self, other: &Rotater) -> bool {
        other
            .matrix
            .multiply(&self.matrix)
            .identity_deviation()
            < IDENTITY_TOLERANCE
    }

    fn transposed(&self) -> &Matrix3 {
        self.transpose.get_or_init(|| self.matrix.transpose())
    }
}
