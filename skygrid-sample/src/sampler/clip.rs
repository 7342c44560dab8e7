//! Exact flux-conserving resampling by polygon clipping.
//!
//! Each output pixel's corner quad is carried into input pixel space
//! and intersected with every overlapping input pixel; contributions
//! are weighted by exact overlap area. When the input projection has
//! a cut, the quad is carried only as far as the projection plane
//! first, split into per-side straddle components there, and each
//! component is accumulated separately. Input pixels whose corners
//! leave the projection's valid plane region are excluded outright,
//! whatever their buffer holds.

use std::sync::Arc;

use skygrid_core::polygon::{clipped_area, convex_area};
use skygrid_core::Vector2;
use skygrid_wcs::{Converter, Projecter, Transform};

use super::{ClipSettings, Sampler};
use crate::image::Image;

pub struct ClipSampler {
    input: Arc<dyn Image>,
    /// Output pixel to input projection plane; the full mapper when
    /// the chain has no projection step left.
    head: Converter,
    /// Projection plane to input pixel, present only when split.
    tail: Option<Converter>,
    /// Input pixel back to the projection plane, for per-pixel
    /// domain checks on bounded projections.
    pixel_to_plane: Option<Converter>,
    projecter: Option<Projecter>,
    settings: ClipSettings,
    sums: Vec<f64>,
    areas: Vec<f64>,
    work: Vec<Vector2>,
    clipped: Vec<Vector2>,
}

impl ClipSampler {
    pub fn new(input: Arc<dyn Image>, mapper: Arc<Converter>, settings: ClipSettings) -> Self {
        let depth = input.depth();
        let (head, tail, projecter) = match split_at_last_projection(&mapper) {
            Some((head, tail, projecter)) => (head, Some(tail), Some(projecter)),
            None => ((*mapper).clone(), None, None),
        };
        let pixel_to_plane = match (&tail, &projecter) {
            (Some(t), Some(p)) if !p.all_plane_valid() => t.inverse().ok(),
            _ => None,
        };
        Self {
            input,
            head,
            tail,
            pixel_to_plane,
            projecter,
            settings,
            sums: vec![0.0; depth],
            areas: vec![0.0; depth],
            work: Vec::new(),
            clipped: Vec::new(),
        }
    }

    fn accumulate(&mut self, poly: &[Vector2]) {
        let mut xmin = f64::INFINITY;
        let mut xmax = f64::NEG_INFINITY;
        let mut ymin = f64::INFINITY;
        let mut ymax = f64::NEG_INFINITY;
        for p in poly {
            xmin = xmin.min(p.x);
            xmax = xmax.max(p.x);
            ymin = ymin.min(p.y);
            ymax = ymax.max(p.y);
        }
        let ix0 = libm::floor(xmin).max(0.0) as usize;
        let iy0 = libm::floor(ymin).max(0.0) as usize;
        let ix1 = (libm::ceil(xmax).max(0.0) as usize).min(self.input.width());
        let iy1 = (libm::ceil(ymax).max(0.0) as usize).min(self.input.height());
        if ix0 >= ix1 || iy0 >= iy1 {
            return;
        }
        let d = self.settings.drizzle;
        if ix1 - ix0 == 1 && iy1 - iy0 == 1 && d >= 1.0 {
            // Entirely inside one input pixel.
            if self.input_pixel_valid(ix0, iy0) {
                let area = convex_area(poly);
                self.deposit(ix0, iy0, area);
            }
            return;
        }
        let margin = (1.0 - d) / 2.0;
        for iy in iy0..iy1 {
            for ix in ix0..ix1 {
                if !self.input_pixel_valid(ix, iy) {
                    continue;
                }
                let area = clipped_area(
                    poly,
                    ix as f64 + margin,
                    iy as f64 + margin,
                    (ix + 1) as f64 - margin,
                    (iy + 1) as f64 - margin,
                    &mut self.work,
                    &mut self.clipped,
                );
                if area > 0.0 {
                    self.deposit(ix, iy, area);
                }
            }
        }
    }

    /// All four corners of an input pixel must lie on the map; finite
    /// buffer values stored outside the projection's domain never
    /// contribute. The test points sit a hair inside the corners so
    /// pixels flush against a map edge survive roundoff.
    fn input_pixel_valid(&self, ix: usize, iy: usize) -> bool {
        let (Some(projecter), Some(back)) = (&self.projecter, &self.pixel_to_plane) else {
            return true;
        };
        const INSET: f64 = 1e-9;
        let x = ix as f64;
        let y = iy as f64;
        let cx = x + 0.5;
        let cy = y + 0.5;
        [
            Vector2::new(x, y),
            Vector2::new(x + 1.0, y),
            Vector2::new(x + 1.0, y + 1.0),
            Vector2::new(x, y + 1.0),
        ]
        .into_iter()
        .all(|c| {
            let p = Vector2::new(c.x + (cx - c.x) * INSET, c.y + (cy - c.y) * INSET);
            projecter.plane_valid(back.apply_plane(p))
        })
    }

    fn deposit(&mut self, ix: usize, iy: usize, area: f64) {
        for z in 0..self.input.depth() {
            let v = self.input.get(self.input.index(ix, iy, z));
            if v.is_finite() {
                self.sums[z] += area * v;
                self.areas[z] += area;
            }
        }
    }
}

impl Sampler for ClipSampler {
    fn sample(&mut self, x: usize, y: usize, out: &mut [f64]) {
        let corners = [
            Vector2::new(x as f64, y as f64),
            Vector2::new(x as f64 + 1.0, y as f64),
            Vector2::new(x as f64 + 1.0, y as f64 + 1.0),
            Vector2::new(x as f64, y as f64 + 1.0),
        ];
        self.sums.iter_mut().for_each(|v| *v = 0.0);
        self.areas.iter_mut().for_each(|v| *v = 0.0);

        if let (Some(projecter), Some(tail)) = (self.projecter.clone(), self.tail.clone()) {
            let mut plane = [Vector2::nan(); 4];
            for (slot, c) in plane.iter_mut().zip(corners.iter()) {
                *slot = self.head.apply_plane(*c);
            }
            if plane.iter().any(|p| !p.is_finite()) {
                return;
            }
            if !projecter.all_plane_valid() && plane.iter().any(|&p| !projecter.plane_valid(p)) {
                return;
            }
            let components = if projecter.straddleable() && projecter.straddles(&plane) {
                projecter.straddle_components(&plane)
            } else {
                vec![plane.to_vec()]
            };
            let mut pixel_poly = Vec::with_capacity(4);
            for component in components {
                pixel_poly.clear();
                pixel_poly.extend(component.iter().map(|&p| tail.apply_plane(p)));
                if pixel_poly.iter().any(|p| !p.is_finite()) {
                    continue;
                }
                self.accumulate(&pixel_poly);
            }
        } else {
            let mut pix = [Vector2::nan(); 4];
            for (slot, c) in pix.iter_mut().zip(corners.iter()) {
                *slot = self.head.apply_plane(*c);
            }
            if pix.iter().any(|p| !p.is_finite()) {
                return;
            }
            self.accumulate(&pix);
        }

        let d2 = self.settings.drizzle * self.settings.drizzle;
        for (z, slot) in out.iter_mut().enumerate().take(self.input.depth()) {
            if self.areas[z] > 0.0 {
                *slot = if self.settings.intensive {
                    self.sums[z] / self.areas[z]
                } else {
                    self.sums[z] / d2
                };
            }
        }
    }

    fn boxed_clone(&self) -> Box<dyn Sampler> {
        Box::new(Self {
            input: self.input.clone(),
            head: self.head.clone(),
            tail: self.tail.clone(),
            pixel_to_plane: self.pixel_to_plane.clone(),
            projecter: self.projecter.clone(),
            settings: self.settings,
            sums: vec![0.0; self.input.depth()],
            areas: vec![0.0; self.input.depth()],
            work: Vec::new(),
            clipped: Vec::new(),
        })
    }
}

/// Splits the mapper around its last projection step, which is the
/// input image's projection. `None` when the chain has no projection
/// step (matching geometries cancel it away).
fn split_at_last_projection(mapper: &Converter) -> Option<(Converter, Converter, Projecter)> {
    let steps = mapper.steps();
    let split = steps
        .iter()
        .rposition(|s| matches!(s, Transform::Project(_)))?;
    let projecter = match &steps[split] {
        Transform::Project(p) => p.clone(),
        _ => return None,
    };
    let mut head = Converter::new();
    for step in &steps[..=split] {
        head.add(step.clone()).ok()?;
    }
    let mut tail = Converter::new();
    for step in &steps[split + 1..] {
        tail.add(step.clone()).ok()?;
    }
    Some((head, tail, projecter))
}
