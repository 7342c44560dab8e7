//! Pseudocylindrical projections: Sfl (Sanson–Flamsteed) and Ait
//! (Hammer–Aitoff). Native center at the +x unit vector, longitude
//! wrapped into (-π, π].

use skygrid_core::constants::{HALF_PI, PI};
use skygrid_core::utils::normalize_angle;
use skygrid_core::{Vector2, Vector3};

pub(crate) fn project_sfl(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    Vector2::new(normalize_angle(lon) * libm::cos(lat), lat)
}

pub(crate) fn deproject_sfl(p: Vector2) -> Vector3 {
    if !p.is_finite() || p.y.abs() > HALF_PI {
        return Vector3::nan();
    }
    let cos_lat = libm::cos(p.y);
    if cos_lat == 0.0 {
        return if p.x.abs() < 1e-12 {
            Vector3::new(0.0, 0.0, p.y.signum())
        } else {
            Vector3::nan()
        };
    }
    let lon = p.x / cos_lat;
    if lon.abs() > PI + 1e-12 {
        return Vector3::nan();
    }
    Vector3::from_spherical(lon, p.y)
}

pub(crate) fn sfl_plane_valid(p: Vector2) -> bool {
    deproject_sfl(p).is_finite()
}

/// Hammer–Aitoff forward with an explicit, possibly unwrapped
/// longitude. Straddle handling re-projects a point with its
/// longitude shifted by ±2π to express it past the map edge.
pub(crate) fn project_ait_raw(lon: f64, lat: f64) -> Vector2 {
    let (sin_lat, cos_lat) = libm::sincos(lat);
    let (sin_half, cos_half) = libm::sincos(lon / 2.0);
    let denom = 1.0 + cos_lat * cos_half;
    if denom <= 0.0 {
        // Antipode of the center.
        return Vector2::nan();
    }
    let gamma = libm::sqrt(2.0 / denom);
    Vector2::new(2.0 * gamma * cos_lat * sin_half, gamma * sin_lat)
}

pub(crate) fn project_ait(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    project_ait_raw(normalize_angle(lon), lat)
}

pub(crate) fn deproject_ait(p: Vector2) -> Vector3 {
    if !p.is_finite() {
        return Vector3::nan();
    }
    let z2 = 1.0 - (p.x / 4.0) * (p.x / 4.0) - (p.y / 2.0) * (p.y / 2.0);
    // z² < 1/2 is outside the 2√2 × √2 ellipse boundary.
    if z2 < 0.5 {
        return Vector3::nan();
    }
    let z = libm::sqrt(z2);
    let lat = libm::asin((p.y * z).clamp(-1.0, 1.0));
    let lon = 2.0 * libm::atan2(z * p.x / 2.0, 2.0 * z2 - 1.0);
    Vector3::from_spherical(lon, lat)
}

pub(crate) fn ait_plane_valid(p: Vector2) -> bool {
    if !p.is_finite() {
        return false;
    }
    1.0 - (p.x / 4.0) * (p.x / 4.0) - (p.y / 2.0) * (p.y / 2.0) >= 0.5
}
