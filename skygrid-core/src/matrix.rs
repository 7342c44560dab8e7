//! Row-major 3×3 rotation matrices.
//!
//! The elementary rotations follow the ERFA sign convention: a
//! positive angle rotates the *coordinate frame* anticlockwise as seen
//! looking toward the origin from the positive axis, so vector
//! components transform with the matrices below. Successive calls to
//! [`Matrix3::rotate_x`] and friends compose so that the first call is
//! the first rotation applied to a vector.

use crate::vector::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix3 {
    m: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub const fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn rows(&self) -> &[[f64; 3]; 3] {
        &self.m
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row][col]
    }

    /// Prepends a frame rotation of `angle` radians about the x axis:
    /// `self` becomes `Rx(angle) * self`.
    pub fn rotate_x(&mut self, angle: f64) {
        let (s, c) = libm::sincos(angle);
        for col in 0..3 {
            let y = self.m[1][col];
            let z = self.m[2][col];
            self.m[1][col] = c * y + s * z;
            self.m[2][col] = -s * y + c * z;
        }
    }

    /// Prepends a frame rotation about the y axis: `Ry(angle) * self`.
    pub fn rotate_y(&mut self, angle: f64) {
        let (s, c) = libm::sincos(angle);
        for col in 0..3 {
            let x = self.m[0][col];
            let z = self.m[2][col];
            self.m[0][col] = c * x - s * z;
            self.m[2][col] = s * x + c * z;
        }
    }

    /// Prepends a frame rotation about the z axis: `Rz(angle) * self`.
    pub fn rotate_z(&mut self, angle: f64) {
        let (s, c) = libm::sincos(angle);
        for col in 0..3 {
            let x = self.m[0][col];
            let y = self.m[1][col];
            self.m[0][col] = c * x + s * y;
            self.m[1][col] = -s * x + c * y;
        }
    }

    /// Matrix product `self * other`; the rightmost factor acts on a
    /// vector first.
    pub fn multiply(&self, other: &Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[i][0] * other.m[0][j]
                    + self.m[i][1] * other.m[1][j]
                    + self.m[i][2] * other.m[2][j];
            }
        }
        Matrix3::from_rows(out)
    }

    /// For a proper rotation the transpose is the inverse.
    pub fn transpose(&self) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[j][i];
            }
        }
        Matrix3::from_rows(out)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    pub fn apply(&self, v: &Vector3) -> Vector3 {
        let m = &self.m;
        Vector3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Sum of absolute element-wise deviations from the identity.
    ///
    /// Zero for the identity; used to decide whether a product of two
    /// rotations cancels.
    pub fn identity_deviation(&self) -> f64 {
        let mut dev = 0.0;
        for (i, row) in self.m.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                let target = if i == j { 1.0 } else { 0.0 };
                dev += (cell - target).abs();
            }
        }
        dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HALF_PI;

    fn assert_close(a: &Vector3, b: &Vector3) {
        assert!(
            (a.x - b.x).abs() < 1e-14 && (a.y - b.y).abs() < 1e-14 && (a.z - b.z).abs() < 1e-14,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn rotate_z_moves_longitude_down() {
        // A frame rotation by +ψ about z maps lon → lon − ψ.
        let mut m = Matrix3::identity();
        m.rotate_z(0.4);
        let v = m.apply(&Vector3::from_spherical(0.4, 0.0));
        assert_close(&v, &Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn rotate_y_carries_pole() {
        // Ry(90° − δ) carries a point at latitude δ onto +z.
        let delta = 0.7;
        let mut m = Matrix3::identity();
        m.rotate_y(HALF_PI - delta);
        let v = m.apply(&Vector3::from_spherical(0.0, delta));
        assert_close(&v, &Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn transpose_inverts() {
        let mut m = Matrix3::identity();
        m.rotate_z(0.3);
        m.rotate_y(-1.1);
        m.rotate_x(2.2);
        let prod = m.multiply(&m.transpose());
        assert!(prod.identity_deviation() < 1e-14);
    }

    #[test]
    fn rotation_has_unit_determinant() {
        let mut m = Matrix3::identity();
        m.rotate_x(0.9);
        m.rotate_z(-0.2);
        assert!((m.determinant() - 1.0).abs() < 1e-14);
    }

    #[test]
    fn composition_order_is_first_call_first() {
        let mut a = Matrix3::identity();
        a.rotate_z(0.5);
        a.rotate_y(0.25);

        let mut rz = Matrix3::identity();
        rz.rotate_z(0.5);
        let mut ry = Matrix3::identity();
        ry.rotate_y(0.25);

        // rotate_y prepends, so a == Ry * Rz.
        let prod = ry.multiply(&rz);
        assert!(prod.multiply(&a.transpose()).identity_deviation() < 1e-13);
    }

    #[test]
    fn identity_deviation_counts_l1() {
        let mut m = Matrix3::identity();
        assert_eq!(m.identity_deviation(), 0.0);
        m.rotate_z(1e-7);
        let dev = m.identity_deviation();
        assert!(dev > 1e-8 && dev < 1e-6);
    }
}
