//! Pole-tangent (zenithal) projections: Tan, Sin, Zea, Arc, Stg.
//!
//! All of them see the sky through the native pole: the projection
//! center is the +z unit vector and the plane radius is a function of
//! colatitude alone. Orientation follows the usual celestial
//! convention: a point east of center lands at +x, north at +y.

use skygrid_core::{Vector2, Vector3};

/// Gnomonic: r = tan(colat). Only the front hemisphere projects.
pub(crate) fn project_tan(v: &Vector3) -> Vector2 {
    if v.z <= 0.0 || !v.is_finite() {
        return Vector2::nan();
    }
    Vector2::new(v.y / v.z, -v.x / v.z)
}

pub(crate) fn deproject_tan(p: Vector2) -> Vector3 {
    if !p.is_finite() {
        return Vector3::nan();
    }
    let z = 1.0 / libm::sqrt(1.0 + p.x * p.x + p.y * p.y);
    Vector3::new(-p.y * z, p.x * z, z)
}

/// Slant orthographic: r = sin(colat) plus the (ξ, η) offset terms.
/// `xi = eta = 0` is plain SIN; `xi = 0, eta = cot δ0` reproduces the
/// old NCP convention exactly.
pub(crate) fn project_sin(v: &Vector3, xi: f64, eta: f64) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    // Slant terms extend the domain past the equator, but the far
    // hemisphere is still double-valued; keep the near side.
    if v.z < 0.0 {
        return Vector2::nan();
    }
    let u = 1.0 - v.z;
    Vector2::new(v.y + xi * u, -v.x + eta * u)
}

pub(crate) fn deproject_sin(p: Vector2, xi: f64, eta: f64) -> Vector3 {
    if !p.is_finite() {
        return Vector3::nan();
    }
    // With u = 1 - sin(lat), the plane point satisfies
    //   u²(ξ²+η²+1) - 2u(xξ + yη + 1) + (x²+y²) = 0;
    // the smaller root is the near-hemisphere solution.
    let a = xi * xi + eta * eta + 1.0;
    let b = 2.0 * (p.x * xi + p.y * eta + 1.0);
    let c = p.x * p.x + p.y * p.y;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vector3::nan();
    }
    let u = (b - libm::sqrt(disc)) / (2.0 * a);
    let z = 1.0 - u;
    if !(-1.0..=1.0).contains(&z) {
        return Vector3::nan();
    }
    Vector3::new(-(p.y - eta * u), p.x - xi * u, z)
}

pub(crate) fn sin_plane_valid(p: Vector2, xi: f64, eta: f64) -> bool {
    let a = xi * xi + eta * eta + 1.0;
    let b = 2.0 * (p.x * xi + p.y * eta + 1.0);
    let c = p.x * p.x + p.y * p.y;
    b * b - 4.0 * a * c >= 0.0
}

/// Zenithal equal-area: r = sqrt(2(1 - sin(lat))).
pub(crate) fn project_zea(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let rho = libm::sqrt(v.x * v.x + v.y * v.y);
    if rho == 0.0 {
        return if v.z > 0.0 {
            Vector2::new(0.0, 0.0)
        } else {
            // The antipode blows the whole boundary circle up to a
            // point; there is no single image.
            Vector2::nan()
        };
    }
    let r = libm::sqrt((2.0 * (1.0 - v.z)).max(0.0));
    Vector2::new(r * v.y / rho, -r * v.x / rho)
}

pub(crate) fn deproject_zea(p: Vector2) -> Vector3 {
    if !p.is_finite() {
        return Vector3::nan();
    }
    let r2 = p.x * p.x + p.y * p.y;
    if r2 > 4.0 {
        return Vector3::nan();
    }
    let z = 1.0 - r2 / 2.0;
    let rho = libm::sqrt((1.0 - z * z).max(0.0));
    let r = libm::sqrt(r2);
    if r == 0.0 {
        return Vector3::new(0.0, 0.0, 1.0);
    }
    Vector3::new(-p.y / r * rho, p.x / r * rho, z)
}

/// Zenithal equidistant: r = colat.
pub(crate) fn project_arc(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let rho = libm::sqrt(v.x * v.x + v.y * v.y);
    if rho == 0.0 {
        return if v.z > 0.0 {
            Vector2::new(0.0, 0.0)
        } else {
            Vector2::nan()
        };
    }
    let r = libm::atan2(rho, v.z);
    Vector2::new(r * v.y / rho, -r * v.x / rho)
}

pub(crate) fn deproject_arc(p: Vector2) -> Vector3 {
    if !p.is_finite() {
        return Vector3::nan();
    }
    let r = libm::sqrt(p.x * p.x + p.y * p.y);
    if r > std::f64::consts::PI {
        return Vector3::nan();
    }
    if r == 0.0 {
        return Vector3::new(0.0, 0.0, 1.0);
    }
    let (rho, z) = libm::sincos(r);
    Vector3::new(-p.y / r * rho, p.x / r * rho, z)
}

/// Stereographic: r = 2 tan(colat / 2). Conformal; everything except
/// the antipode projects.
pub(crate) fn project_stg(v: &Vector3) -> Vector2 {
    if !v.is_finite() || v.z <= -1.0 + 1e-15 {
        return Vector2::nan();
    }
    let s = 2.0 / (1.0 + v.z);
    Vector2::new(s * v.y, -s * v.x)
}

pub(crate) fn deproject_stg(p: Vector2) -> Vector3 {
    if !p.is_finite() {
        return Vector3::nan();
    }
    let r2 = (p.x * p.x + p.y * p.y) / 4.0;
    let s = 1.0 / (1.0 + r2);
    Vector3::new(-p.y * s, p.x * s, (1.0 - r2) * s)
}
