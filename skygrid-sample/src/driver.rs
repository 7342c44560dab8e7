//! Whole-image resampling loop.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use skygrid_wcs::Wcs;

use crate::depth::DepthSampler;
use crate::error::{SampleError, SampleResult};
use crate::image::Image;
use crate::sampler::{build, ClipSettings, SamplerSpec};

/// Options beyond the sampler choice itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResampleSettings {
    pub clip: ClipSettings,
    /// Depth-axis rebinning; `None` requires matching plane counts.
    pub depth: Option<DepthSampler>,
}

/// Fills `output` by sampling `input` through the geometry mapper
/// derived from the two images' coordinate systems. Pixels the input
/// cannot supply are written as NaN.
pub fn resample(
    input: Arc<dyn Image>,
    output: &mut dyn Image,
    spec: &SamplerSpec,
    settings: &ResampleSettings,
) -> SampleResult<()> {
    let depth = match settings.depth {
        Some(d) if d.depth() != output.depth() => {
            return Err(SampleError::depth_mismatch(output.depth(), d.depth()));
        }
        Some(d) if d.is_identity(input.depth()) => None,
        Some(d) => Some(d),
        None if input.depth() != output.depth() => {
            return Err(SampleError::depth_mismatch(output.depth(), input.depth()));
        }
        None => None,
    };

    let mapper = Arc::new(Wcs::pixel_mapper(output.wcs(), input.wcs())?);
    debug!(steps = mapper.steps().len(), sampler = ?spec, "resampling");
    let prototype = build(spec, input.clone(), mapper, settings.clip)?;

    let width = output.width();
    let height = output.height();
    let depth_in = input.depth();

    // Row-major staging at input depth; samplers leave NaN where the
    // input has nothing to offer.
    let mut staging = vec![f64::NAN; width * height * depth_in];
    staging
        .par_chunks_mut(width * depth_in)
        .enumerate()
        .for_each(|(y, row)| {
            let mut sampler = prototype.boxed_clone();
            for (x, pixel) in row.chunks_mut(depth_in).enumerate() {
                sampler.sample(x, y, pixel);
            }
        });

    for y in 0..height {
        for x in 0..width {
            let base = (y * width + x) * depth_in;
            let planes = &staging[base..base + depth_in];
            match depth {
                Some(d) => {
                    for (z, v) in d.rebin(planes).into_iter().enumerate() {
                        output.set(output.index(x, y, z), v);
                    }
                }
                None => {
                    for (z, &v) in planes.iter().enumerate() {
                        output.set(output.index(x, y, z), v);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::tan_wcs;
    use crate::image::ArrayImage;

    #[test]
    fn identity_resample_copies_the_image() {
        let wcs = tan_wcs(180.0, 0.0, 12, 12, 1.0);
        let data: Vec<f64> = (0..144).map(|i| i as f64).collect();
        let input: Arc<dyn Image> =
            Arc::new(ArrayImage::from_data(wcs.clone(), 12, 12, 1, data.clone()));
        let mut output = ArrayImage::new(wcs, 12, 12, 1);
        resample(
            input,
            &mut output,
            &SamplerSpec::Nearest,
            &ResampleSettings::default(),
        )
        .unwrap();
        assert_eq!(output.data(), &data[..]);
    }

    #[test]
    fn mismatched_depths_are_rejected() {
        let wcs = tan_wcs(180.0, 0.0, 4, 4, 1.0);
        let input: Arc<dyn Image> = Arc::new(ArrayImage::new(wcs.clone(), 4, 4, 3));
        let mut output = ArrayImage::new(wcs, 4, 4, 2);
        let err = resample(
            input,
            &mut output,
            &SamplerSpec::Nearest,
            &ResampleSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SampleError::DepthMismatch { .. }));
    }

    #[test]
    fn depth_rebinning_merges_planes() {
        let wcs = tan_wcs(180.0, 0.0, 4, 4, 1.0);
        let mut data = vec![0.0; 4 * 4 * 2];
        for i in 0..16 {
            data[i] = 1.0;
            data[16 + i] = 3.0;
        }
        let input: Arc<dyn Image> = Arc::new(ArrayImage::from_data(wcs.clone(), 4, 4, 2, data));
        let mut output = ArrayImage::new(wcs, 4, 4, 1);
        let settings = ResampleSettings {
            clip: ClipSettings::default(),
            depth: Some(DepthSampler::new(0.0, 2.0, 1)),
        };
        resample(input, &mut output, &SamplerSpec::Nearest, &settings).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(output.get(output.index(x, y, 0)), 4.0);
            }
        }
    }
}
