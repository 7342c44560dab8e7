//! Cylindrical projections: Car (plate carrée) and Mer (Mercator).
//!
//! The native center is the +x unit vector; longitude is wrapped into
//! (-π, π], so the map tiles in x with period 2π and the cut sits at
//! the ±180° meridian.

use skygrid_core::constants::{HALF_PI, PI};
use skygrid_core::utils::normalize_angle;
use skygrid_core::{Vector2, Vector3};

pub(crate) fn project_car(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    Vector2::new(normalize_angle(lon), lat)
}

pub(crate) fn deproject_car(p: Vector2) -> Vector3 {
    if !car_plane_valid(p) {
        return Vector3::nan();
    }
    Vector3::from_spherical(p.x, p.y)
}

pub(crate) fn car_plane_valid(p: Vector2) -> bool {
    p.is_finite() && p.x.abs() <= PI && p.y.abs() <= HALF_PI
}

pub(crate) fn project_mer(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    if lat.abs() >= HALF_PI {
        // Poles run off to infinity.
        return Vector2::nan();
    }
    Vector2::new(normalize_angle(lon), libm::atanh(libm::sin(lat)))
}

pub(crate) fn deproject_mer(p: Vector2) -> Vector3 {
    if !mer_plane_valid(p) {
        return Vector3::nan();
    }
    Vector3::from_spherical(p.x, libm::atan(libm::sinh(p.y)))
}

pub(crate) fn mer_plane_valid(p: Vector2) -> bool {
    p.is_finite() && p.x.abs() <= PI
}
