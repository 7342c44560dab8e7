//! Hpx, the HEALPix projection (H = 4, K = 3), plus the nested pixel
//! index lookup for plane points.
//!
//! The equatorial band |sin lat| <= 2/3 is cylindrical equal-area;
//! each polar cap splits into four Collignon triangles riding on top
//! of the band. The butterfly of facets is not straddle-handled: a
//! plane point outside its facet is simply invalid.

use skygrid_core::constants::{HALF_PI, PI, QUARTER_PI};
use skygrid_core::utils::{normalize_angle, normalize_positive};
use skygrid_core::{Vector2, Vector3};

/// |sin lat| at the equatorial/polar transition.
const Z_TRANSITION: f64 = 2.0 / 3.0;

/// Small slack when testing facet membership, so footprint corners
/// sitting exactly on a facet edge stay usable.
const EDGE_EPS: f64 = 1e-12;

/// Center longitude of the polar facet containing longitude `phi`
/// (wrapped to (-π, π]).
fn facet_center(phi: f64) -> f64 {
    let k = (((phi + PI) / HALF_PI).floor() as i64).clamp(0, 3);
    -PI + (2 * k + 1) as f64 * QUARTER_PI
}

pub(crate) fn project_hpx(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    let phi = normalize_angle(lon);
    let z = libm::sin(lat);

    if z.abs() <= Z_TRANSITION {
        return Vector2::new(phi, 3.0 * PI / 8.0 * z);
    }

    let sigma = libm::sqrt(3.0 * (1.0 - z.abs()));
    let phi_c = facet_center(phi);
    Vector2::new(
        phi_c + (phi - phi_c) * sigma,
        z.signum() * QUARTER_PI * (2.0 - sigma),
    )
}

pub(crate) fn deproject_hpx(p: Vector2) -> Vector3 {
    if !p.is_finite() || p.x.abs() > PI + EDGE_EPS || p.y.abs() > HALF_PI + EDGE_EPS {
        return Vector3::nan();
    }

    if p.y.abs() <= QUARTER_PI {
        let z = p.y * 8.0 / (3.0 * PI);
        return Vector3::from_spherical(p.x, libm::asin(z));
    }

    let sigma = 2.0 - p.y.abs() * 4.0 / PI;
    let phi_c = facet_center(p.x);
    if (p.x - phi_c).abs() > QUARTER_PI * sigma + EDGE_EPS {
        // Between polar facets.
        return Vector3::nan();
    }
    let z = p.y.signum() * (1.0 - sigma * sigma / 3.0);
    let phi = if sigma > 0.0 {
        phi_c + (p.x - phi_c) / sigma
    } else {
        phi_c
    };
    Vector3::from_spherical(phi, libm::asin(z.clamp(-1.0, 1.0)))
}

pub(crate) fn hpx_plane_valid(p: Vector2) -> bool {
    if !p.is_finite() || p.x.abs() > PI + EDGE_EPS {
        return false;
    }
    if p.y.abs() <= QUARTER_PI {
        return true;
    }
    if p.y.abs() > HALF_PI + EDGE_EPS {
        return false;
    }
    let sigma = 2.0 - p.y.abs() * 4.0 / PI;
    (p.x - facet_center(p.x)).abs() <= QUARTER_PI * sigma + EDGE_EPS
}

/// Nested-scheme HEALPix pixel index at `order` (nside = 2^order) for
/// a plane point, or None when the point is off the map.
pub(crate) fn nested_index(p: Vector2, order: u32) -> Option<u64> {
    let v = deproject_hpx(p);
    if !v.is_finite() {
        return None;
    }
    let (lon, lat) = v.to_spherical();
    let z = libm::sin(lat);
    let nside: u64 = 1 << order;
    let tt = normalize_positive(lon) / HALF_PI; // [0, 4)

    let (face, ix, iy): (u64, u64, u64);
    if z.abs() <= Z_TRANSITION {
        let temp1 = nside as f64 * (0.5 + tt);
        let temp2 = nside as f64 * (z * 0.75);
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        let ifp = jp >> order;
        let ifm = jm >> order;
        face = if ifp == ifm {
            (ifp & 3) as u64 + 4
        } else if ifp < ifm {
            (ifp & 3) as u64
        } else {
            (ifm & 3) as u64 + 8
        };
        ix = (jm & (nside as i64 - 1)) as u64;
        iy = nside - 1 - (jp & (nside as i64 - 1)) as u64;
    } else {
        let ntt = (tt as u64).min(3);
        let tp = tt - ntt as f64;
        let tmp = nside as f64 * libm::sqrt(3.0 * (1.0 - z.abs()));
        let jp = ((tp * tmp) as u64).min(nside - 1);
        let jm = (((1.0 - tp) * tmp) as u64).min(nside - 1);
        if z >= 0.0 {
            face = ntt;
            ix = nside - 1 - jm;
            iy = nside - 1 - jp;
        } else {
            face = ntt + 8;
            ix = jp;
            iy = jm;
        }
    }

    Some(face * nside * nside + (interleave(ix) | (interleave(iy) << 1)))
}

/// Spreads the low 32 bits of `v` into the even bit positions.
fn interleave(v: u64) -> u64 {
    let mut x = v & 0xffff_ffff;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    (x | (x << 1)) & 0x5555_5555_5555_5555
}
