//! Bilinear interpolation.

use std::sync::Arc;

use skygrid_core::Vector2;
use skygrid_wcs::Converter;

use super::Sampler;
use crate::image::Image;

pub struct LinearSampler {
    input: Arc<dyn Image>,
    mapper: Arc<Converter>,
}

impl LinearSampler {
    pub fn new(input: Arc<dyn Image>, mapper: Arc<Converter>) -> Self {
        Self { input, mapper }
    }
}

impl Sampler for LinearSampler {
    fn sample(&mut self, x: usize, y: usize, out: &mut [f64]) {
        let center = Vector2::new(x as f64 + 0.5, y as f64 + 0.5);
        let p = self.mapper.apply_plane(center);
        if !p.is_finite() {
            return;
        }
        // Stored values live at pixel centers.
        let px = p.x - 0.5;
        let py = p.y - 0.5;
        let x0 = libm::floor(px);
        let y0 = libm::floor(py);
        if x0 < 0.0
            || y0 < 0.0
            || x0 + 1.0 >= self.input.width() as f64
            || y0 + 1.0 >= self.input.height() as f64
        {
            return;
        }
        let fx = px - x0;
        let fy = py - y0;
        let (x0, y0) = (x0 as usize, y0 as usize);
        for (z, slot) in out.iter_mut().enumerate().take(self.input.depth()) {
            let v00 = self.input.get(self.input.index(x0, y0, z));
            let v10 = self.input.get(self.input.index(x0 + 1, y0, z));
            let v01 = self.input.get(self.input.index(x0, y0 + 1, z));
            let v11 = self.input.get(self.input.index(x0 + 1, y0 + 1, z));
            *slot = (1.0 - fy) * ((1.0 - fx) * v00 + fx * v10)
                + fy * ((1.0 - fx) * v01 + fx * v11);
        }
    }

    fn boxed_clone(&self) -> Box<dyn Sampler> {
        Box::new(Self {
            input: self.input.clone(),
            mapper: self.mapper.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::tan_wcs;
    use crate::image::ArrayImage;
    use skygrid_wcs::{Scaler, Transform, Wcs};

    fn ramp_image(width: usize, height: usize) -> Arc<dyn Image> {
        let wcs = tan_wcs(180.0, 0.0, width, height, 1.0);
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(x as f64 + 10.0 * y as f64);
            }
        }
        Arc::new(ArrayImage::from_data(wcs, width, height, 1, data))
    }

    #[test]
    fn identity_mapping_reproduces_centers() {
        let input = ramp_image(8, 8);
        let mapper = Arc::new(Wcs::pixel_mapper(input.wcs(), input.wcs()).unwrap());
        let mut s = LinearSampler::new(input, mapper);
        let mut out = [f64::NAN];
        s.sample(4, 2, &mut out);
        assert!((out[0] - (4.0 + 20.0)).abs() < 1e-12);
    }

    #[test]
    fn half_pixel_shift_averages_neighbors() {
        let input = ramp_image(8, 8);
        // Shift output pixel centers half a pixel in input x.
        let mut mapper = Converter::new();
        mapper
            .add(Transform::Scale(Scaler::new(0.5, 0.0, 1.0, 0.0, 0.0, 1.0)))
            .unwrap();
        let mut s = LinearSampler::new(input, Arc::new(mapper));
        let mut out = [f64::NAN];
        s.sample(3, 4, &mut out);
        // Between centers of x = 3 and x = 4 on row 4.
        assert!((out[0] - (3.5 + 40.0)).abs() < 1e-12, "{}", out[0]);
    }

    #[test]
    fn ramp_survives_linear_interpolation_through_a_sky_shift() {
        let input = ramp_image(32, 32);
        // Output grid centered 0.25 arcsec east of the input grid;
        // east runs toward -x, so input positions sit 0.25 px west.
        let out_wcs = tan_wcs(180.0 + 0.25 / 3600.0, 0.0, 32, 32, 1.0);
        let mapper = Arc::new(Wcs::pixel_mapper(&out_wcs, input.wcs()).unwrap());
        let mut s = LinearSampler::new(input, mapper);
        let mut out = [f64::NAN];
        s.sample(10, 10, &mut out);
        assert!((out[0] - (9.75 + 100.0)).abs() < 1e-6, "{}", out[0]);
    }

    #[test]
    fn edge_pixels_have_no_data() {
        let input = ramp_image(4, 4);
        let mapper = Arc::new(Wcs::pixel_mapper(input.wcs(), input.wcs()).unwrap());
        let mut s = LinearSampler::new(input, mapper);
        let mut out = [f64::NAN];
        // The outermost half-pixel ring cannot interpolate.
        s.sample(0, 0, &mut out);
        assert!(out[0].is_nan());
    }
}
