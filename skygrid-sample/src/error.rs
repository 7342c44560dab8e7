//! Resampling errors.
//!
//! As in the geometry layer, per-pixel failures are NaN "no data"
//! values, not errors; errors here mean the resampling could not be
//! set up at all.

use skygrid_wcs::WcsError;
use thiserror::Error;

pub type SampleResult<T> = Result<T, SampleError>;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Wcs(#[from] WcsError),

    #[error("unknown sampler: {name}")]
    UnknownSampler { name: String },

    #[error("depth mismatch: output carries {expected} planes, sampler produces {actual}")]
    DepthMismatch { expected: usize, actual: usize },
}

impl SampleError {
    pub fn unknown_sampler(name: impl Into<String>) -> Self {
        Self::UnknownSampler { name: name.into() }
    }

    pub fn depth_mismatch(expected: usize, actual: usize) -> Self {
        Self::DepthMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_geometry_errors() {
        let e: SampleError = WcsError::missing_keyword("CRVAL1").into();
        assert!(e.to_string().contains("CRVAL1"));
    }
}
