//! Convex-polygon clipping and area for pixel-overlap accounting.
//!
//! Polygons are vertex lists in drawing order (either winding).
//! Callers pass reusable scratch vectors so the per-pixel hot loop
//! does not allocate.

use crate::vector::Vector2;

/// Twice-area contributions below this are treated as exact zero to
/// absorb roundoff from near-degenerate clip slivers.
pub const AREA_SNAP: f64 = 1e-10;

/// Area of a convex polygon by fan triangulation from the first
/// vertex. Winding-insensitive; never negative.
pub fn convex_area(poly: &[Vector2]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let origin = poly[0];
    let mut doubled = 0.0;
    for i in 1..poly.len() - 1 {
        let a = poly[i] - origin;
        let b = poly[i + 1] - origin;
        let mut t = a.cross(&b).abs();
        if t < AREA_SNAP {
            t = 0.0;
        }
        doubled += t;
    }
    doubled / 2.0
}

/// Clips `poly` to the axis-aligned rectangle [xmin, xmax] × [ymin,
/// ymax] by Sutherland–Hodgman, one half-plane at a time. The result
/// lands in `out`; `work` is scratch. Either may end up empty when
/// the polygon misses the rectangle.
pub fn clip_to_rect(
    poly: &[Vector2],
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    work: &mut Vec<Vector2>,
    out: &mut Vec<Vector2>,
) {
    work.clear();
    out.clear();

    clip_half_plane(poly, work, |p| p.x >= xmin, |a, b| cross_x(a, b, xmin));
    clip_half_plane(work, out, |p| p.x <= xmax, |a, b| cross_x(a, b, xmax));
    std::mem::swap(work, out);
    clip_half_plane(work, out, |p| p.y >= ymin, |a, b| cross_y(a, b, ymin));
    std::mem::swap(work, out);
    clip_half_plane(work, out, |p| p.y <= ymax, |a, b| cross_y(a, b, ymax));
}

/// Convenience wrapper: clipped area with caller-provided scratch.
pub fn clipped_area(
    poly: &[Vector2],
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    work: &mut Vec<Vector2>,
    out: &mut Vec<Vector2>,
) -> f64 {
    clip_to_rect(poly, xmin, ymin, xmax, ymax, work, out);
    convex_area(out)
}

fn clip_half_plane(
    src: &[Vector2],
    dst: &mut Vec<Vector2>,
    inside: impl Fn(&Vector2) -> bool,
    intersect: impl Fn(&Vector2, &Vector2) -> Vector2,
) {
    dst.clear();
    if src.is_empty() {
        return;
    }
    let mut prev = src[src.len() - 1];
    let mut prev_in = inside(&prev);
    for &cur in src {
        let cur_in = inside(&cur);
        if cur_in {
            if !prev_in {
                dst.push(intersect(&prev, &cur));
            }
            dst.push(cur);
        } else if prev_in {
            dst.push(intersect(&prev, &cur));
        }
        prev = cur;
        prev_in = cur_in;
    }
}

fn cross_x(a: &Vector2, b: &Vector2, x: f64) -> Vector2 {
    let t = (x - a.x) / (b.x - a.x);
    Vector2::new(x, a.y + t * (b.y - a.y))
}

fn cross_y(a: &Vector2, b: &Vector2, y: f64) -> Vector2 {
    let t = (y - a.y) / (b.y - a.y);
    Vector2::new(a.x + t * (b.x - a.x), y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_in(poly: &[Vector2], xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> f64 {
        let mut work = Vec::new();
        let mut out = Vec::new();
        clipped_area(poly, xmin, ymin, xmax, ymax, &mut work, &mut out)
    }

    fn unit_square_at(x: f64, y: f64) -> [Vector2; 4] {
        [
            Vector2::new(x, y),
            Vector2::new(x + 1.0, y),
            Vector2::new(x + 1.0, y + 1.0),
            Vector2::new(x, y + 1.0),
        ]
    }

    #[test]
    fn unit_square_area() {
        assert!((convex_area(&unit_square_at(2.0, 3.0)) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn winding_does_not_matter() {
        let mut square = unit_square_at(0.0, 0.0);
        square.reverse();
        assert!((convex_area(&square) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn degenerate_polygons_have_zero_area() {
        assert_eq!(convex_area(&[]), 0.0);
        assert_eq!(convex_area(&[Vector2::new(1.0, 1.0), Vector2::new(2.0, 2.0)]), 0.0);
        // Collinear sliver below the snap threshold.
        let sliver = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.5, 1e-12),
        ];
        assert_eq!(convex_area(&sliver), 0.0);
    }

    #[test]
    fn clip_fully_inside_is_identity() {
        let square = unit_square_at(1.0, 1.0);
        let mut work = Vec::new();
        let mut out = Vec::new();
        clip_to_rect(&square, 0.0, 0.0, 5.0, 5.0, &mut work, &mut out);
        assert_eq!(out.len(), 4);
        assert!((convex_area(&out) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn clip_fully_outside_is_empty() {
        let square = unit_square_at(10.0, 10.0);
        assert_eq!(area_in(&square, 0.0, 0.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn clip_quarter_overlap() {
        // Square centered on a rect corner: one quarter survives.
        let square = unit_square_at(-0.5, -0.5);
        let a = area_in(&square, 0.0, 0.0, 4.0, 4.0);
        assert!((a - 0.25).abs() < 1e-14);
    }

    #[test]
    fn rotated_pixel_partitions_across_grid() {
        // A tilted unit square split over four grid cells; the pieces
        // must add back to the whole.
        let c = 0.6_f64.cos();
        let s = 0.6_f64.sin();
        let rot: Vec<Vector2> = unit_square_at(-0.5, -0.5)
            .iter()
            .map(|p| Vector2::new(c * p.x - s * p.y + 1.0, s * p.x + c * p.y + 1.0))
            .collect();
        let mut total = 0.0;
        for i in 0..2 {
            for j in 0..2 {
                total += area_in(&rot, i as f64, j as f64, i as f64 + 1.0, j as f64 + 1.0);
            }
        }
        assert!((total - 1.0).abs() < 1e-12, "total {total}");
    }
}
