//! Csc, the COBE quadrilateralized spherical cube.
//!
//! The sphere is split over six cube faces laid out as a sideways T:
//! the equatorial band spans x in [-π, π] at |y| <= π/4, with the
//! polar faces stacked above and below the lon-0 face. Each face is a
//! (π/2)-sided square; the COBE polynomial distorts the tangent-plane
//! coordinates to make the mapping nearly equal-area. The published
//! inverse polynomial matches the forward one to a few parts in 10⁴,
//! so round trips are close but not exact.

use skygrid_core::constants::{HALF_PI, PI, QUARTER_PI};
use skygrid_core::{Vector2, Vector3};

struct Face {
    index: u8,
    xi: f64,
    eta: f64,
    zeta: f64,
    x_c: f64,
    y_c: f64,
}

/// Picks the cube face whose outward normal is closest to `v`.
fn select_face(v: &Vector3) -> Face {
    let (l, m, n) = (v.x, v.y, v.z);

    let candidates = [
        (0, m, -l, n, 0.0, HALF_PI),
        (1, m, n, l, 0.0, 0.0),
        (2, -l, n, m, HALF_PI, 0.0),
        (3, -m, n, -l, PI, 0.0),
        (4, l, n, -m, -HALF_PI, 0.0),
        (5, m, l, -n, 0.0, -HALF_PI),
    ];

    let mut best = Face {
        index: 0,
        xi: 0.0,
        eta: 0.0,
        zeta: f64::NEG_INFINITY,
        x_c: 0.0,
        y_c: 0.0,
    };
    for (index, xi, eta, zeta, x_c, y_c) in candidates {
        if zeta > best.zeta {
            best = Face {
                index,
                xi,
                eta,
                zeta,
                x_c,
                y_c,
            };
        }
    }
    best
}

/// Face index and face-relative offsets for a plane point in the
/// sideways-T layout, or None outside it.
fn face_from_plane(p: Vector2) -> Option<(u8, f64, f64)> {
    if !p.is_finite() {
        return None;
    }
    let (index, x_c, y_c) = if p.y > QUARTER_PI {
        (0, 0.0, HALF_PI)
    } else if p.y < -QUARTER_PI {
        (5, 0.0, -HALF_PI)
    } else if p.x.abs() <= QUARTER_PI {
        (1, 0.0, 0.0)
    } else if (QUARTER_PI..=3.0 * QUARTER_PI).contains(&p.x) {
        (2, HALF_PI, 0.0)
    } else if p.x.abs() > 3.0 * QUARTER_PI {
        (3, if p.x > 0.0 { PI } else { -PI }, 0.0)
    } else {
        (4, -HALF_PI, 0.0)
    };
    let dx = p.x - x_c;
    let dy = p.y - y_c;
    if dx.abs() > QUARTER_PI || dy.abs() > QUARTER_PI {
        return None;
    }
    Some((index, dx, dy))
}

fn face_to_direction(face: u8, xi: f64, eta: f64, zeta: f64) -> Vector3 {
    match face {
        0 => Vector3::new(-eta, xi, zeta),
        1 => Vector3::new(zeta, xi, eta),
        2 => Vector3::new(-xi, zeta, eta),
        3 => Vector3::new(-zeta, -xi, eta),
        4 => Vector3::new(xi, -zeta, eta),
        _ => Vector3::new(eta, xi, -zeta),
    }
}

pub(crate) fn project_csc(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let face = select_face(v);
    if face.zeta <= 0.0 {
        return Vector2::nan();
    }
    let chi = face.xi / face.zeta;
    let psi = face.eta / face.zeta;
    // Face 3 is centered on the ±180° meridian; wrap its west half
    // back into (-π, π].
    let x = skygrid_core::utils::normalize_angle(face.x_c + QUARTER_PI * forward_poly(chi, psi));
    Vector2::new(x, face.y_c + QUARTER_PI * forward_poly(psi, chi))
}

pub(crate) fn deproject_csc(p: Vector2) -> Vector3 {
    let Some((face, dx, dy)) = face_from_plane(p) else {
        return Vector3::nan();
    };
    let xn = dx / QUARTER_PI;
    let yn = dy / QUARTER_PI;

    let chi = inverse_poly(xn, yn);
    let psi = inverse_poly(yn, xn);

    let zeta = 1.0 / libm::sqrt(1.0 + chi * chi + psi * psi);
    face_to_direction(face, chi * zeta, psi * zeta, zeta)
}

pub(crate) fn csc_plane_valid(p: Vector2) -> bool {
    face_from_plane(p).is_some()
}

/// COBE forward distortion F(χ, ψ) on normalized face coordinates;
/// the y coordinate uses the same function with arguments swapped.
fn forward_poly(chi: f64, psi: f64) -> f64 {
    const GAMMA_STAR: f64 = 1.37484847732;
    const M: f64 = 0.004869491981;
    const GAMMA: f64 = -0.13161671474;
    const OMEGA1: f64 = -0.159596235474;
    const C00: f64 = 0.141189631152;
    const C10: f64 = 0.0809701286525;
    const C01: f64 = -0.281528535557;
    const C20: f64 = -0.178251207466;
    const C11: f64 = 0.15384112876;
    const C02: f64 = 0.106959469314;
    const D0: f64 = 0.0759196200467;
    const D1: f64 = -0.0217762490699;

    let chi2 = chi * chi;
    let psi2 = psi * psi;

    let c_poly =
        C00 + C10 * chi2 + C01 * psi2 + C20 * chi2 * chi2 + C11 * chi2 * psi2 + C02 * psi2 * psi2;
    let d_poly = D0 + D1 * chi2;

    chi * GAMMA_STAR
        + chi * chi2 * (1.0 - GAMMA_STAR)
        + chi * psi2 * (1.0 - chi2) * (GAMMA + (M - GAMMA) * chi2 + (1.0 - psi2) * c_poly)
        + chi * chi2 * (1.0 - chi2) * (OMEGA1 - (1.0 - chi2) * d_poly)
}

/// Published series inverse: f(X, Y) = X + X(1 - X²) Σ P_ij X²ⁱ Y²ʲ.
fn inverse_poly(x: f64, y: f64) -> f64 {
    const P: [[f64; 7]; 7] = [
        [
            -0.27292696,
            -0.02819452,
            0.27058160,
            -0.60441560,
            0.93412077,
            -0.63915306,
            0.14381585,
        ],
        [
            -0.07629969,
            -0.01471565,
            -0.56800938,
            1.50880086,
            -1.41601920,
            0.52032238,
            0.0,
        ],
        [
            -0.22797056,
            0.48051509,
            0.30803317,
            -0.93678576,
            0.33887446,
            0.0,
            0.0,
        ],
        [
            0.54852384,
            -1.74114454,
            0.98938102,
            0.08693841,
            0.0,
            0.0,
            0.0,
        ],
        [-0.62930065, 1.71547508, -0.83180469, 0.0, 0.0, 0.0, 0.0],
        [0.25795794, -0.53022337, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.02584375, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ];

    let x2 = x * x;
    let y2 = y * y;

    let mut sum = 0.0;
    let mut x_pow = 1.0;
    for (i, row) in P.iter().enumerate() {
        let mut y_pow = 1.0;
        for coeff in row.iter().take(7 - i) {
            sum += coeff * x_pow * y_pow;
            y_pow *= y2;
        }
        x_pow *= x2;
    }

    x + x * (1.0 - x2) * sum
}
