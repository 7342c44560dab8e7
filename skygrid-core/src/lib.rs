//! Geometric primitives for mapping between the celestial sphere and
//! pixel grids: Cartesian vectors, rotation matrices, planar polygon
//! clipping, and the numeric constants the rest of the workspace
//! shares.

pub mod constants;
pub mod polygon;
pub mod test_helpers;
pub mod utils;

mod matrix;
mod vector;

pub use matrix::Matrix3;
pub use vector::{Vector2, Vector3};
