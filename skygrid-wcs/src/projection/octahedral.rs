//! Octahedral all-sky maps: Toa (TOAST) and Tea (analytic equal-area).
//!
//! Both carve the sphere into eight spherical triangles. TOAST maps
//! them onto a [-π, π]² square (north pole at the center, south pole
//! splayed to the corners, equator on the inscribed diamond) by
//! recursive midpoint subdivision, which makes it hierarchical: the
//! quadtree tile address of a point is just its binary plane
//! coordinate. Tea instead uses a closed-form Collignon triangle per
//! longitude quadrant, equal-area but interrupted between polar
//! triangles.

use skygrid_core::constants::{HALF_PI, PI, QUARTER_PI};
use skygrid_core::utils::{normalize_angle, normalize_positive};
use skygrid_core::{Vector2, Vector3};

/// Subdivision depth; 30 halvings put the result well below a
/// nanoradian.
const LEVELS: u32 = 30;

const SIDE_EPS: f64 = 1e-12;

/// Plane position of the equator vertex at longitude q·90°.
fn diamond_vertex(q: usize) -> Vector2 {
    match q & 3 {
        0 => Vector2::new(PI, 0.0),
        1 => Vector2::new(0.0, PI),
        2 => Vector2::new(-PI, 0.0),
        _ => Vector2::new(0.0, -PI),
    }
}

fn sphere_vertex(q: usize) -> Vector3 {
    Vector3::from_spherical((q & 3) as f64 * HALF_PI, 0.0)
}

/// True when `p` lies inside (or on) the spherical triangle a, b, c.
fn in_spherical_triangle(a: &Vector3, b: &Vector3, c: &Vector3, p: &Vector3) -> bool {
    let edges = [(a, b), (b, c), (c, a)];
    let opposite = [c, a, b];
    for ((u, v), w) in edges.iter().zip(opposite) {
        let n = u.cross(v);
        if n.dot(p) * n.dot(w) < -SIDE_EPS {
            return false;
        }
    }
    true
}

fn in_planar_triangle(a: Vector2, b: Vector2, c: Vector2, p: Vector2) -> bool {
    let orient = (b - a).cross(&(c - a));
    for (u, v) in [(a, b), (b, c), (c, a)] {
        let s = (v - u).cross(&(p - u));
        if s * orient < -SIDE_EPS {
            return false;
        }
    }
    true
}

fn midpoint_sphere(a: &Vector3, b: &Vector3) -> Vector3 {
    (*a + *b).normalized()
}

fn midpoint_plane(a: Vector2, b: Vector2) -> Vector2 {
    (a + b) * 0.5
}

/// Initial octant for a direction: the pole vertex plus two adjacent
/// equator vertices, on both the sphere and the plane.
fn toa_octant(v: &Vector3) -> ([Vector3; 3], [Vector2; 3]) {
    let (lon, _) = v.to_spherical();
    let q = ((normalize_positive(lon) / HALF_PI) as usize).min(3);
    let se1 = sphere_vertex(q);
    let se2 = sphere_vertex(q + 1);
    let pe1 = diamond_vertex(q);
    let pe2 = diamond_vertex(q + 1);
    if v.z >= 0.0 {
        (
            [Vector3::new(0.0, 0.0, 1.0), se1, se2],
            [Vector2::new(0.0, 0.0), pe1, pe2],
        )
    } else {
        (
            [Vector3::new(0.0, 0.0, -1.0), se1, se2],
            [pe1 + pe2, pe1, pe2], // the corner shared by this octant
        )
    }
}

pub(crate) fn project_toa(v: &Vector3) -> Vector2 {
    if !v.is_finite() || v.magnitude() == 0.0 {
        return Vector2::nan();
    }
    let u = v.normalized();
    let (mut sph, mut pla) = toa_octant(&u);

    for _ in 0..LEVELS {
        let sab = midpoint_sphere(&sph[0], &sph[1]);
        let sbc = midpoint_sphere(&sph[1], &sph[2]);
        let sca = midpoint_sphere(&sph[2], &sph[0]);
        let pab = midpoint_plane(pla[0], pla[1]);
        let pbc = midpoint_plane(pla[1], pla[2]);
        let pca = midpoint_plane(pla[2], pla[0]);

        if in_spherical_triangle(&sph[0], &sab, &sca, &u) {
            sph = [sph[0], sab, sca];
            pla = [pla[0], pab, pca];
        } else if in_spherical_triangle(&sph[1], &sbc, &sab, &u) {
            sph = [sph[1], sbc, sab];
            pla = [pla[1], pbc, pab];
        } else if in_spherical_triangle(&sph[2], &sca, &sbc, &u) {
            sph = [sph[2], sca, sbc];
            pla = [pla[2], pca, pbc];
        } else {
            sph = [sab, sbc, sca];
            pla = [pab, pbc, pca];
        }
    }

    (pla[0] + pla[1] + pla[2]) * (1.0 / 3.0)
}

/// Initial octant for a plane point: inside the equator diamond is
/// the northern hemisphere, outside it the southern.
fn toa_plane_octant(p: Vector2) -> ([Vector3; 3], [Vector2; 3]) {
    let q = match (p.x >= 0.0, p.y >= 0.0) {
        (true, true) => 0,
        (false, true) => 1,
        (false, false) => 2,
        (true, false) => 3,
    };
    let se1 = sphere_vertex(q);
    let se2 = sphere_vertex(q + 1);
    let pe1 = diamond_vertex(q);
    let pe2 = diamond_vertex(q + 1);
    if p.x.abs() + p.y.abs() <= PI {
        (
            [Vector3::new(0.0, 0.0, 1.0), se1, se2],
            [Vector2::new(0.0, 0.0), pe1, pe2],
        )
    } else {
        (
            [Vector3::new(0.0, 0.0, -1.0), se1, se2],
            [pe1 + pe2, pe1, pe2],
        )
    }
}

pub(crate) fn deproject_toa(p: Vector2) -> Vector3 {
    if !toa_plane_valid(p) {
        return Vector3::nan();
    }
    let (mut sph, mut pla) = toa_plane_octant(p);

    for _ in 0..LEVELS {
        let sab = midpoint_sphere(&sph[0], &sph[1]);
        let sbc = midpoint_sphere(&sph[1], &sph[2]);
        let sca = midpoint_sphere(&sph[2], &sph[0]);
        let pab = midpoint_plane(pla[0], pla[1]);
        let pbc = midpoint_plane(pla[1], pla[2]);
        let pca = midpoint_plane(pla[2], pla[0]);

        if in_planar_triangle(pla[0], pab, pca, p) {
            sph = [sph[0], sab, sca];
            pla = [pla[0], pab, pca];
        } else if in_planar_triangle(pla[1], pbc, pab, p) {
            sph = [sph[1], sbc, sab];
            pla = [pla[1], pbc, pab];
        } else if in_planar_triangle(pla[2], pca, pbc, p) {
            sph = [sph[2], sca, sbc];
            pla = [pla[2], pca, pbc];
        } else {
            sph = [sab, sbc, sca];
            pla = [pab, pbc, pca];
        }
    }

    ((sph[0] + sph[1] + sph[2]) * (1.0 / 3.0)).normalized()
}

pub(crate) fn toa_plane_valid(p: Vector2) -> bool {
    p.is_finite() && p.x.abs() <= PI + SIDE_EPS && p.y.abs() <= PI + SIDE_EPS
}

/// Quadtree tile column/row at `level` for a plane point; the whole
/// map is tile (0, 0) at level 0.
pub(crate) fn toa_tile_address(p: Vector2, level: u32) -> Option<(u64, u64)> {
    if !toa_plane_valid(p) || level > 62 {
        return None;
    }
    let n = (1u64 << level) as f64;
    let col = (((p.x + PI) / (2.0 * PI) * n) as u64).min((1u64 << level) - 1);
    let row = (((p.y + PI) / (2.0 * PI) * n) as u64).min((1u64 << level) - 1);
    Some((col, row))
}

/// Center longitude of the Tea quadrant containing `phi` in (-π, π].
fn tea_quadrant_center(phi: f64) -> f64 {
    let k = (((phi + PI) / HALF_PI).floor() as i64).clamp(0, 3);
    -PI + (2 * k + 1) as f64 * QUARTER_PI
}

/// Tea forward with the quadrant center pinned; straddle handling
/// uses this to re-express a point in a neighbouring quadrant's
/// frame.
pub(crate) fn project_tea_forced(v: &Vector3, phi_c: f64) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, lat) = v.to_spherical();
    let dphi = normalize_angle(lon - phi_c);
    let sigma = libm::sqrt(1.0 - libm::sin(lat).abs());
    Vector2::new(
        phi_c + dphi * sigma,
        lat.signum() * HALF_PI * (1.0 - sigma),
    )
}

pub(crate) fn project_tea(v: &Vector3) -> Vector2 {
    if !v.is_finite() {
        return Vector2::nan();
    }
    let (lon, _) = v.to_spherical();
    project_tea_forced(v, tea_quadrant_center(normalize_angle(lon)))
}

pub(crate) fn deproject_tea(p: Vector2) -> Vector3 {
    if !p.is_finite() || p.y.abs() > HALF_PI + SIDE_EPS {
        return Vector3::nan();
    }
    let sigma = (1.0 - p.y.abs() / HALF_PI).max(0.0);
    let phi_c = tea_quadrant_center(p.x);
    if (p.x - phi_c).abs() > QUARTER_PI * sigma + SIDE_EPS {
        return Vector3::nan();
    }
    let lat = p.y.signum() * libm::asin((1.0 - sigma * sigma).clamp(0.0, 1.0));
    let phi = if sigma > 0.0 {
        phi_c + (p.x - phi_c) / sigma
    } else {
        phi_c
    };
    Vector3::from_spherical(phi, lat)
}

pub(crate) fn tea_plane_valid(p: Vector2) -> bool {
    if !p.is_finite() || p.y.abs() > HALF_PI + SIDE_EPS {
        return false;
    }
    let sigma = (1.0 - p.y.abs() / HALF_PI).max(0.0);
    (p.x - tea_quadrant_center(p.x)).abs() <= QUARTER_PI * sigma + SIDE_EPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_core::constants::DEG_TO_RAD;

    #[test]
    fn toa_anchor_points() {
        let north = project_toa(&Vector3::new(0.0, 0.0, 1.0));
        assert!(north.x.abs() < 1e-8 && north.y.abs() < 1e-8);

        // Equator vertices sit on the diamond.
        let e0 = project_toa(&Vector3::new(1.0, 0.0, 0.0));
        assert!((e0.x - PI).abs() < 1e-8 && e0.y.abs() < 1e-8);

        let e1 = project_toa(&Vector3::new(0.0, 1.0, 0.0));
        assert!(e1.x.abs() < 1e-8 && (e1.y - PI).abs() < 1e-8);
    }

    #[test]
    fn toa_round_trips() {
        for lon_deg in [5.0, 80.0, 175.0, 185.0, 300.0] {
            for lat_deg in [-75.0, -30.0, 0.5, 45.0, 88.0] {
                let v = Vector3::from_spherical(lon_deg * DEG_TO_RAD, lat_deg * DEG_TO_RAD);
                let p = project_toa(&v);
                assert!(p.is_finite(), "({lon_deg}, {lat_deg}) did not project");
                let back = deproject_toa(p);
                assert!(
                    (back - v).magnitude() < 1e-7,
                    "({lon_deg}, {lat_deg}): {v:?} vs {back:?}"
                );
            }
        }
    }

    #[test]
    fn toa_equator_lies_on_diamond() {
        for lon_deg in [10.0, 100.0, 200.0, 340.0] {
            let v = Vector3::from_spherical(lon_deg * DEG_TO_RAD, 0.0);
            let p = project_toa(&v);
            assert!(
                (p.x.abs() + p.y.abs() - PI).abs() < 1e-7,
                "lon {lon_deg}: {p:?}"
            );
        }
    }

    #[test]
    fn toa_tile_address_descends() {
        let p = Vector2::new(0.5, -0.5);
        assert_eq!(toa_tile_address(p, 0), Some((0, 0)));
        // x = 0.5 is in the right half, y = -0.5 in the bottom half.
        assert_eq!(toa_tile_address(p, 1), Some((1, 0)));
        let (c, r) = toa_tile_address(p, 8).unwrap();
        assert!(c >= 128 && r < 128);
        assert_eq!(toa_tile_address(Vector2::new(4.0, 0.0), 3), None);
    }

    #[test]
    fn tea_anchor_points() {
        let center = project_tea(&Vector3::from_spherical(QUARTER_PI, 0.0));
        assert!((center.x - QUARTER_PI).abs() < 1e-12 && center.y.abs() < 1e-12);

        let pole = project_tea(&Vector3::new(0.0, 0.0, 1.0));
        assert!((pole.y - HALF_PI).abs() < 1e-12);
    }

    #[test]
    fn tea_round_trips() {
        for lon_deg in [-170.0, -100.0, -10.0, 44.0, 46.0, 135.0] {
            for lat_deg in [-80.0, -45.0, 0.0, 30.0, 89.0] {
                let v = Vector3::from_spherical(lon_deg * DEG_TO_RAD, lat_deg * DEG_TO_RAD);
                let back = deproject_tea(project_tea(&v));
                assert!(
                    (back - v).magnitude() < 1e-10,
                    "({lon_deg}, {lat_deg}) -> {back:?}"
                );
            }
        }
    }

    #[test]
    fn tea_equator_is_continuous_across_quadrants() {
        let west = project_tea(&Vector3::from_spherical(QUARTER_PI - 1e-9, 0.0));
        let east = project_tea(&Vector3::from_spherical(QUARTER_PI + 1e-9, 0.0));
        assert!((west.x - east.x).abs() < 1e-8);
    }

    #[test]
    fn tea_gores_are_invalid() {
        // Off the triangle edge at mid-northern latitude.
        let y = 0.8;
        let sigma = 1.0 - y / HALF_PI;
        let edge_x = -QUARTER_PI + QUARTER_PI * sigma;
        assert!(tea_plane_valid(Vector2::new(edge_x - 1e-6, y)));
        assert!(!tea_plane_valid(Vector2::new(edge_x + 1e-3, y)));
    }

    #[test]
    fn tea_area_scale_is_uniform() {
        // Equal-area: a small sphere patch keeps the same plane area
        // ratio (π/4) anywhere on the map.
        let patch = |lon: f64, lat: f64| {
            let d = 1e-4;
            let a = project_tea(&Vector3::from_spherical(lon, lat));
            let b = project_tea(&Vector3::from_spherical(lon + d, lat));
            let c = project_tea(&Vector3::from_spherical(lon, lat + d));
            let plane = ((b - a).cross(&(c - a))).abs();
            let sphere = d * d * libm::cos(lat);
            plane / sphere
        };
        let r1 = patch(0.1, 0.0);
        let r2 = patch(0.3, 1.2);
        let r3 = patch(-2.0, -0.9);
        assert!((r1 - PI / 4.0).abs() < 1e-3, "{r1}");
        assert!((r2 - PI / 4.0).abs() < 1e-3, "{r2}");
        assert!((r3 - PI / 4.0).abs() < 1e-3, "{r3}");
    }
}
