//! Lanczos windowed-sinc interpolation.

use std::sync::Arc;

use skygrid_core::constants::PI;
use skygrid_core::Vector2;
use skygrid_wcs::Converter;

use super::Sampler;
use crate::image::Image;

pub struct LanczosSampler {
    input: Arc<dyn Image>,
    mapper: Arc<Converter>,
    /// Kernel half-width; 2n taps per axis.
    n: usize,
    wx: Vec<f64>,
    wy: Vec<f64>,
}

impl LanczosSampler {
    pub fn new(input: Arc<dyn Image>, mapper: Arc<Converter>, n: usize) -> Self {
        let n = n.max(1);
        Self {
            input,
            mapper,
            n,
            wx: vec![0.0; 2 * n],
            wy: vec![0.0; 2 * n],
        }
    }

    /// Normalized kernel weights for a fractional offset in [0, 1).
    fn weights(n: usize, frac: f64, w: &mut [f64]) {
        let mut sum = 0.0;
        for (k, slot) in w.iter_mut().enumerate() {
            // Tap k sits at integer offset k - (n - 1) from the floor.
            let t = frac - (k as f64 - (n as f64 - 1.0));
            *slot = lanczos_kernel(n as f64, t);
            sum += *slot;
        }
        if sum != 0.0 {
            for slot in w.iter_mut() {
                *slot /= sum;
            }
        }
    }
}

fn lanczos_kernel(n: f64, t: f64) -> f64 {
    if t.abs() >= n {
        return 0.0;
    }
    sinc(t) * sinc(t / n)
}

fn sinc(t: f64) -> f64 {
    if t == 0.0 {
        1.0
    } else {
        let a = PI * t;
        libm::sin(a) / a
    }
}

impl Sampler for LanczosSampler {
    fn sample(&mut self, x: usize, y: usize, out: &mut [f64]) {
        let center = Vector2::new(x as f64 + 0.5, y as f64 + 0.5);
        let p = self.mapper.apply_plane(center);
        if !p.is_finite() {
            return;
        }
        let px = p.x - 0.5;
        let py = p.y - 0.5;
        let x0 = libm::floor(px);
        let y0 = libm::floor(py);
        let n = self.n as f64;
        // Every tap must land inside the image.
        if x0 - (n - 1.0) < 0.0
            || y0 - (n - 1.0) < 0.0
            || x0 + n >= self.input.width() as f64
            || y0 + n >= self.input.height() as f64
        {
            return;
        }
        Self::weights(self.n, px - x0, &mut self.wx);
        Self::weights(self.n, py - y0, &mut self.wy);
        let bx = x0 as usize - (self.n - 1);
        let by = y0 as usize - (self.n - 1);
        for (z, slot) in out.iter_mut().enumerate().take(self.input.depth()) {
            let mut acc = 0.0;
            for (j, &wy) in self.wy.iter().enumerate() {
                let mut row = 0.0;
                for (i, &wx) in self.wx.iter().enumerate() {
                    row += wx * self.input.get(self.input.index(bx + i, by + j, z));
                }
                acc += wy * row;
            }
            *slot = acc;
        }
    }

    fn boxed_clone(&self) -> Box<dyn Sampler> {
        Box::new(Self {
            input: self.input.clone(),
            mapper: self.mapper.clone(),
            n: self.n,
            wx: vec![0.0; 2 * self.n],
            wy: vec![0.0; 2 * self.n],
        })
    }
}
