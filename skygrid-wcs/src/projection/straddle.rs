//! Splitting pixel footprints that cross a projection cut.
//!
//! An output pixel whose corners land on both sides of the ±180°
//! meridian (or, for Tea, in different polar triangles) turns into a
//! polygon spanning the whole map. Each affected vertex is instead
//! re-expressed as its "shadow": the same sky point written just past
//! the opposite map edge, giving one well-formed polygon per side.
//! The shadow parts reach beyond the map boundary; they are not
//! clipped here, because off-map plane regions correspond to pixels
//! that either do not exist or fail the plane-validity test during
//! overlap accumulation. The Ait ellipse edge in particular is never
//! clipped exactly.

use skygrid_core::constants::{PI, TWO_PI};
use skygrid_core::Vector2;

use super::octahedral::project_tea_forced;
use super::pseudocylindrical::project_ait_raw;
use super::Projecter;

/// True when the footprint wraps a cut and needs splitting. Only
/// meaningful for straddleable projections with finite vertices.
pub(crate) fn straddles(proj: &Projecter, pts: &[Vector2]) -> bool {
    if pts.is_empty() || pts.iter().any(|p| !p.is_finite()) {
        return false;
    }
    match proj {
        Projecter::Car | Projecter::Mer | Projecter::Ait => span(pts, |p| p.x) > PI,
        Projecter::Toa => span(pts, |p| p.x) > PI || span(pts, |p| p.y) > PI,
        Projecter::Tea => {
            let first = tea_quadrant(pts[0]);
            pts[1..].iter().any(|&p| tea_quadrant(p) != first)
        }
        _ => false,
    }
}

/// Component polygons for a straddling footprint, one per map side
/// (or per Tea quadrant touched).
pub(crate) fn components(proj: &Projecter, pts: &[Vector2]) -> Vec<Vec<Vector2>> {
    if !straddles(proj, pts) {
        return vec![pts.to_vec()];
    }
    match proj {
        Projecter::Car | Projecter::Mer => split_wrap(pts, |p, dir| translate_x(p, dir), |p| p.x),
        Projecter::Ait => split_wrap(pts, shadow_ait, |p| p.x),
        Projecter::Toa => {
            let mut out = Vec::new();
            let wrap_x = span(pts, |p| p.x) > PI;
            let wrap_y = span(pts, |p| p.y) > PI;
            let xs: Vec<Vec<Vector2>> = if wrap_x {
                split_wrap(pts, |p, dir| translate_x(p, dir), |p| p.x)
            } else {
                vec![pts.to_vec()]
            };
            for poly in xs {
                if wrap_y {
                    out.extend(split_wrap(&poly, translate_y, |p| p.y));
                } else {
                    out.push(poly);
                }
            }
            out
        }
        Projecter::Tea => tea_components(proj, pts),
        _ => vec![pts.to_vec()],
    }
}

fn span(pts: &[Vector2], coord: impl Fn(&Vector2) -> f64) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in pts {
        let c = coord(p);
        min = min.min(c);
        max = max.max(c);
    }
    max - min
}

/// Two components: one with the negative-side vertices shadowed past
/// the positive edge, one with the positive-side vertices shadowed
/// past the negative edge.
fn split_wrap(
    pts: &[Vector2],
    shadow: impl Fn(Vector2, f64) -> Vector2,
    coord: impl Fn(&Vector2) -> f64,
) -> Vec<Vec<Vector2>> {
    let positive: Vec<Vector2> = pts
        .iter()
        .map(|&p| if coord(&p) < 0.0 { shadow(p, 1.0) } else { p })
        .collect();
    let negative: Vec<Vector2> = pts
        .iter()
        .map(|&p| if coord(&p) >= 0.0 { shadow(p, -1.0) } else { p })
        .collect();
    vec![positive, negative]
}

fn translate_x(p: Vector2, dir: f64) -> Vector2 {
    Vector2::new(p.x + dir * TWO_PI, p.y)
}

fn translate_y(p: Vector2, dir: f64) -> Vector2 {
    Vector2::new(p.x, p.y + dir * TWO_PI)
}

/// Re-projects an Ait vertex with its longitude unwrapped by ±2π, so
/// the shadow follows the curved map edge instead of a flat offset.
fn shadow_ait(p: Vector2, dir: f64) -> Vector2 {
    let v = super::pseudocylindrical::deproject_ait(p);
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    let lon = skygrid_core::utils::normalize_angle(lon);
    project_ait_raw(lon + dir * TWO_PI, lat)
}

fn tea_quadrant(p: Vector2) -> i64 {
    (((p.x + PI) / (PI / 2.0)).floor() as i64).clamp(0, 3)
}

fn tea_center(q: i64) -> f64 {
    -PI + (2 * q + 1) as f64 * (PI / 4.0)
}

/// One component per quadrant touched; foreign vertices are
/// re-expressed in that quadrant's frame via the forced projection.
fn tea_components(proj: &Projecter, pts: &[Vector2]) -> Vec<Vec<Vector2>> {
    let mut quads: Vec<i64> = pts.iter().map(|&p| tea_quadrant(p)).collect();
    quads.sort_unstable();
    quads.dedup();

    quads
        .iter()
        .map(|&q| {
            let phi_c = tea_center(q);
            pts.iter()
                .map(|&p| {
                    if tea_quadrant(p) == q {
                        p
                    } else {
                        project_tea_forced(&proj.deproject(p), phi_c)
                    }
                })
                .collect()
        })
        .collect()
}
