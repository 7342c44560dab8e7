//! Planar and spatial Cartesian vectors.

use std::ops::{Add, Mul, Neg, Sub};

/// A point or displacement in a projection plane or pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise finiteness; NaN components mark "no data" points.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// A point carrying the "no data" marker on both components.
    pub const fn nan() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the cross product, twice the signed area of the
    /// triangle (0, self, other).
    #[inline]
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.dot(self))
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: f64) -> Vector2 {
        Vector2::new(self.x * rhs, self.y * rhs)
    }
}

/// A direction or position in 3-space, usually a unit vector on the
/// celestial sphere with x toward (lon 0, lat 0), z toward the north
/// pole.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// All-NaN direction, the "no data" marker.
    pub const fn nan() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    /// Unit vector from spherical coordinates in radians.
    ///
    /// `lon` is measured eastward from x toward y, `lat` from the
    /// xy-plane toward +z.
    pub fn from_spherical(lon: f64, lat: f64) -> Self {
        let (sin_lon, cos_lon) = libm::sincos(lon);
        let (sin_lat, cos_lat) = libm::sincos(lat);
        Self::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Spherical coordinates `(lon, lat)` in radians, lon in [0, 2π).
    ///
    /// The zero vector maps to (0, 0).
    pub fn to_spherical(&self) -> (f64, f64) {
        let r = self.magnitude();
        if r == 0.0 {
            return (0.0, 0.0);
        }
        let mut lon = libm::atan2(self.y, self.x);
        if lon < 0.0 {
            lon += crate::constants::TWO_PI;
        }
        let lat = libm::asin((self.z / r).clamp(-1.0, 1.0));
        (lon, lat)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        libm::sqrt(self.dot(self))
    }

    /// Scaled copy with unit magnitude; the zero vector is returned
    /// unchanged.
    pub fn normalized(&self) -> Self {
        let r = self.magnitude();
        if r == 0.0 {
            *self
        } else {
            *self * (1.0 / r)
        }
    }

    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub const fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f64) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_ulp_lt;
    use crate::constants::{HALF_PI, PI};

    #[test]
    fn spherical_round_trip() {
        let v = Vector3::from_spherical(1.25, -0.6);
        let (lon, lat) = v.to_spherical();
        assert_ulp_lt!(lon, 1.25, 4);
        assert_ulp_lt!(lat, -0.6, 4);
        assert_ulp_lt!(v.magnitude(), 1.0, 2);
    }

    #[test]
    fn spherical_axes() {
        let x = Vector3::from_spherical(0.0, 0.0);
        assert!((x.x - 1.0).abs() < 1e-15 && x.y.abs() < 1e-15 && x.z.abs() < 1e-15);

        let z = Vector3::from_spherical(0.3, HALF_PI);
        assert!((z.z - 1.0).abs() < 1e-15);
        assert!(z.x.abs() < 1e-15 && z.y.abs() < 1e-15);
    }

    #[test]
    fn longitude_wraps_positive() {
        let v = Vector3::from_spherical(-0.25, 0.0);
        let (lon, _) = v.to_spherical();
        assert_ulp_lt!(lon, 2.0 * PI - 0.25, 8);
    }

    #[test]
    fn zero_vector_is_origin() {
        assert_eq!(Vector3::zero().to_spherical(), (0.0, 0.0));
        assert_eq!(Vector3::zero().normalized(), Vector3::zero());
    }

    #[test]
    fn cross_is_orthogonal() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(-2.0, 0.5, 1.0);
        let c = a.cross(&b);
        assert!(c.dot(&a).abs() < 1e-12);
        assert!(c.dot(&b).abs() < 1e-12);
    }

    #[test]
    fn planar_cross_signed_area() {
        let a = Vector2::new(2.0, 0.0);
        let b = Vector2::new(0.0, 3.0);
        assert_eq!(a.cross(&b), 6.0);
        assert_eq!(b.cross(&a), -6.0);
    }
}
