//! Resampling of celestial images between pixel grids.
//!
//! An output grid is filled one pixel at a time: each output pixel is
//! carried through the geometry mapper built by [`skygrid_wcs`] into
//! the input grid and a [`Sampler`] estimates its value there. The
//! [`resample`] driver runs that loop over whole images, in parallel
//! by row, with optional depth-axis rebinning.

pub mod depth;
pub mod error;
pub mod image;
pub mod sampler;

mod driver;

pub use depth::DepthSampler;
pub use driver::{resample, ResampleSettings};
pub use error::{SampleError, SampleResult};
pub use image::{ArrayImage, Image};
pub use sampler::{build, ClipSettings, Sampler, SamplerSpec};
