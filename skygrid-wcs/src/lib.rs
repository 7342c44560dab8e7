//! Sky-to-pixel geometry: composable transforms, map projections,
//! coordinate frames, and FITS-style WCS header handling.
//!
//! The building blocks are [`Rotater`], [`Scaler`], the [`Projecter`]
//! catalog and the distorters, composed into a [`Converter`] chain and
//! bundled as a [`Wcs`]. All angles are radians; degrees appear only
//! at the header boundary.

pub mod coordsys;
pub mod distortion;
pub mod error;
pub mod header;
pub mod projection;

mod rotater;
mod scaler;
mod transform;
mod wcs;

pub use coordsys::{CoordinateSystem, Frame, SphereDistorter};
pub use distortion::{Distorter, PlateDistorter, ScanDistorter};
pub use error::{WcsError, WcsResult};
pub use header::{KeywordMap, KeywordProvider, KeywordValue};
pub use projection::{Projecter, Projection};
pub use rotater::Rotater;
pub use scaler::Scaler;
pub use transform::{Converter, Transform};
pub use wcs::Wcs;
