//! The sampler family.
//!
//! A sampler is bound to one input image and one transform from
//! output pixel coordinates to input pixel coordinates; `sample`
//! computes one output pixel's depth column. Output buffers arrive
//! NaN-filled and a sampler leaves "no data" pixels untouched, so NaN
//! is the universal missing-value marker.

mod clip;
mod lanczos;
mod linear;
mod nearest;
mod spline;

pub use clip::ClipSampler;
pub use lanczos::LanczosSampler;
pub use linear::LinearSampler;
pub use nearest::NearestSampler;
pub use spline::SplineSampler;

use std::sync::Arc;

use skygrid_wcs::Converter;

use crate::error::{SampleError, SampleResult};
use crate::image::Image;

/// One output pixel's worth of work. Implementations carry their own
/// scratch state; `boxed_clone` hands each worker a private copy while
/// sharing read-only tables.
pub trait Sampler: Send + Sync {
    /// Computes the depth column of output pixel `(x, y)` into `out`
    /// (one slot per input plane). Leaves `out` untouched where there
    /// is no data.
    fn sample(&mut self, x: usize, y: usize, out: &mut [f64]);

    fn boxed_clone(&self) -> Box<dyn Sampler>;
}

/// Parsed sampler selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerSpec {
    Nearest,
    Linear,
    /// Windowed sinc with the given half-width.
    Lanczos(usize),
    /// B-spline interpolation of the given degree (2-5).
    Spline(usize),
    /// Exact flux-conserving polygon clipping.
    Clip,
    /// Clip with nearest-neighbor fill for its NaN pixels.
    Combo,
}

impl SamplerSpec {
    /// Parses names like `NN`, `LI`, `Lanczos3`, `Spline4`, `Clip`,
    /// `Combo`. Lanczos and Spline default their order when the
    /// suffix is absent.
    pub fn parse(name: &str) -> SampleResult<Self> {
        let trimmed = name.trim();
        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "nn" => return Ok(Self::Nearest),
            "li" => return Ok(Self::Linear),
            "clip" => return Ok(Self::Clip),
            "combo" => return Ok(Self::Combo),
            _ => {}
        }
        if let Some(rest) = lower.strip_prefix("lanczos") {
            let n = parse_order(rest, 3, 1..=9).ok_or_else(|| SampleError::unknown_sampler(name))?;
            return Ok(Self::Lanczos(n));
        }
        if let Some(rest) = lower.strip_prefix("spline") {
            let n = parse_order(rest, 3, 2..=5).ok_or_else(|| SampleError::unknown_sampler(name))?;
            return Ok(Self::Spline(n));
        }
        Err(SampleError::unknown_sampler(name))
    }
}

fn parse_order(rest: &str, default: usize, range: std::ops::RangeInclusive<usize>) -> Option<usize> {
    if rest.is_empty() {
        return Some(default);
    }
    let n: usize = rest.parse().ok()?;
    range.contains(&n).then_some(n)
}

/// Clip sampler tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSettings {
    /// Active-area fraction of each input pixel, `(0, 1]`.
    pub drizzle: f64,
    /// Area-weighted mean (surface-brightness-like data) rather than
    /// summed flux.
    pub intensive: bool,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            drizzle: 1.0,
            intensive: true,
        }
    }
}

/// Instantiates a sampler over `input` and the output-pixel to
/// input-pixel `mapper`.
pub fn build(
    spec: &SamplerSpec,
    input: Arc<dyn Image>,
    mapper: Arc<Converter>,
    clip: ClipSettings,
) -> SampleResult<Box<dyn Sampler>> {
    Ok(match spec {
        SamplerSpec::Nearest => Box::new(NearestSampler::new(input, mapper)),
        SamplerSpec::Linear => Box::new(LinearSampler::new(input, mapper)),
        SamplerSpec::Lanczos(n) => Box::new(LanczosSampler::new(input, mapper, *n)),
        SamplerSpec::Spline(degree) => Box::new(SplineSampler::new(input, mapper, *degree)?),
        SamplerSpec::Clip => Box::new(ClipSampler::new(input, mapper, clip)),
        SamplerSpec::Combo => {
            let primary = ClipSampler::new(input.clone(), mapper.clone(), clip);
            let backup = NearestSampler::new(input, mapper);
            Box::new(ComboSampler::new(Box::new(primary), Box::new(backup)))
        }
    })
}

/// Primary sampler with a backup filling its NaN pixels.
pub struct ComboSampler {
    primary: Box<dyn Sampler>,
    backup: Box<dyn Sampler>,
    scratch: Vec<f64>,
}

impl ComboSampler {
    pub fn new(primary: Box<dyn Sampler>, backup: Box<dyn Sampler>) -> Self {
        Self {
            primary,
            backup,
            scratch: Vec::new(),
        }
    }
}

impl Sampler for ComboSampler {
    fn sample(&mut self, x: usize, y: usize, out: &mut [f64]) {
        self.primary.sample(x, y, out);
        if out.iter().all(|v| v.is_finite()) {
            return;
        }
        self.scratch.clear();
        self.scratch.resize(out.len(), f64::NAN);
        self.backup.sample(x, y, &mut self.scratch);
        for (o, &b) in out.iter_mut().zip(self.scratch.iter()) {
            if !o.is_finite() && b.is_finite() {
                *o = b;
            }
        }
    }

    fn boxed_clone(&self) -> Box<dyn Sampler> {
        Box::new(Self {
            primary: self.primary.boxed_clone(),
            backup: self.backup.boxed_clone(),
            scratch: Vec::new(),
        })
    }
}
