//! Rebinning along the third (depth) axis.
//!
//! Input planes are treated as unit-width bins at integer offsets.
//! An output bin `k` covers `[zero + k * delta, zero + (k + 1) * delta)`
//! in input bin units; each input plane contributes its value in
//! proportion to the overlap length.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSampler {
    zero: f64,
    delta: f64,
    n: usize,
}

impl DepthSampler {
    pub fn new(zero: f64, delta: f64, n: usize) -> Self {
        Self { zero, delta, n }
    }

    /// Output plane count.
    pub fn depth(&self) -> usize {
        self.n
    }

    /// True when rebinning would copy planes through unchanged.
    pub fn is_identity(&self, input_depth: usize) -> bool {
        self.zero == 0.0 && self.delta == 1.0 && self.n == input_depth
    }

    /// Redistributes one pixel's plane values into the output bins.
    /// NaN planes poison every bin they overlap.
    pub fn rebin(&self, planes: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n];
        for (k, slot) in out.iter_mut().enumerate() {
            let lo = self.zero + k as f64 * self.delta;
            let hi = lo + self.delta;
            let first = libm::floor(lo).max(0.0) as usize;
            let last = (libm::ceil(hi).max(0.0) as usize).min(planes.len());
            if first >= last {
                *slot = f64::NAN;
                continue;
            }
            let mut acc = 0.0;
            for (z, &v) in planes.iter().enumerate().take(last).skip(first) {
                let overlap = (hi.min(z as f64 + 1.0) - lo.max(z as f64)).max(0.0);
                if overlap > 0.0 {
                    acc += overlap * v;
                }
            }
            // Bins reaching past the input stack are partial data.
            if lo < 0.0 || hi > planes.len() as f64 {
                *slot = f64::NAN;
            } else {
                *slot = acc;
            }
        }
        out
    }
}
