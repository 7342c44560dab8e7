//! The pixel-buffer capability contract.
//!
//! The engine never reads files; it consumes anything exposing a flat
//! numeric buffer with a WCS. Pixels are addressed `(x, y, z)` with
//! `x` fastest, planes slowest; pixel centers sit at half-integer
//! pixel coordinates.

use skygrid_wcs::Wcs;

pub trait Image: Send + Sync {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn depth(&self) -> usize;

    fn get(&self, index: usize) -> f64;
    fn set(&mut self, index: usize, value: f64);

    fn wcs(&self) -> &Wcs;

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height() + y) * self.width() + x
    }

    #[inline]
    fn pixel_count(&self) -> usize {
        self.width() * self.height() * self.depth()
    }
}

/// In-memory image over a `Vec<f64>`.
#[derive(Debug, Clone)]
pub struct ArrayImage {
    width: usize,
    height: usize,
    depth: usize,
    wcs: Wcs,
    data: Vec<f64>,
}

impl ArrayImage {
    /// A zero-filled image.
    pub fn new(wcs: Wcs, width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
            wcs,
            data: vec![0.0; width * height * depth],
        }
    }

    /// Wraps an existing buffer; `data` must hold exactly
    /// `width * height * depth` values.
    pub fn from_data(wcs: Wcs, width: usize, height: usize, depth: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), width * height * depth);
        Self {
            width,
            height,
            depth,
            wcs,
            data,
        }
    }

    /// Same-value fill, handy for flats and tests.
    pub fn filled(wcs: Wcs, width: usize, height: usize, depth: usize, value: f64) -> Self {
        Self::from_data(wcs, width, height, depth, vec![value; width * height * depth])
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

impl Image for ArrayImage {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn get(&self, index: usize) -> f64 {
        self.data[index]
    }

    #[inline]
    fn set(&mut self, index: usize, value: f64) {
        self.data[index] = value;
    }

    #[inline]
    fn wcs(&self) -> &Wcs {
        &self.wcs
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::tan_wcs;
    use super::*;

    #[test]
    fn indexing_is_plane_major() {
        let wcs = tan_wcs(180.0, 0.0, 4, 3, 1.0);
        let mut img = ArrayImage::new(wcs, 4, 3, 2);
        let i = img.index(1, 2, 1);
        assert_eq!(i, (1 * 3 + 2) * 4 + 1);
        img.set(i, 7.5);
        assert_eq!(img.get(i), 7.5);
        assert_eq!(img.pixel_count(), 24);
    }

    #[test]
    fn filled_image_holds_the_value() {
        let wcs = tan_wcs(180.0, 0.0, 5, 5, 1.0);
        let img = ArrayImage::filled(wcs, 5, 5, 1, 3.25);
        assert!(img.data().iter().all(|&v| v == 3.25));
    }
}
