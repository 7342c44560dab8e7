//! Nearest-neighbor lookup.

use std::sync::Arc;

use skygrid_core::Vector2;
use skygrid_wcs::Converter;

use super::Sampler;
use crate::image::Image;

pub struct NearestSampler {
    input: Arc<dyn Image>,
    mapper: Arc<Converter>,
}

impl NearestSampler {
    pub fn new(input: Arc<dyn Image>, mapper: Arc<Converter>) -> Self {
        Self { input, mapper }
    }
}

impl Sampler for NearestSampler {
    fn sample(&mut self, x: usize, y: usize, out: &mut [f64]) {
        let center = Vector2::new(x as f64 + 0.5, y as f64 + 0.5);
        let p = self.mapper.apply_plane(center);
        if !p.is_finite() {
            return;
        }
        let ix = libm::floor(p.x);
        let iy = libm::floor(p.y);
        if ix < 0.0
            || iy < 0.0
            || ix >= self.input.width() as f64
            || iy >= self.input.height() as f64
        {
            return;
        }
        let (ix, iy) = (ix as usize, iy as usize);
        for (z, slot) in out.iter_mut().enumerate().take(self.input.depth()) {
            *slot = self.input.get(self.input.index(ix, iy, z));
        }
    }

    fn boxed_clone(&self) -> Box<dyn Sampler> {
        Box::new(Self {
            input: self.input.clone(),
            mapper: self.mapper.clone(),
        })
    }
}
