//! The transform steps a coordinate chain is built from.
//!
//! Every step works on a fixed `[f64; 3]` buffer: 3-vectors use all
//! three slots, plane points the first two with the third zeroed.
//! Steps never fail per point; a point leaving a step's domain comes
//! out as NaN and rides the rest of the chain unchanged.

use skygrid_core::{Vector2, Vector3};

use crate::coordsys::SphereDistorter;
use crate::distortion::Distorter;
use crate::error::{WcsError, WcsResult};
use crate::projection::Projecter;
use crate::rotater::Rotater;
use crate::scaler::Scaler;

#[derive(Debug, Clone)]
pub enum Transform {
    /// Sphere rotation, 3 → 3.
    Rotate(Rotater),
    /// Plane affine, 2 → 2.
    Scale(Scaler),
    /// Sphere to projection plane, 3 → 2.
    Project(Projecter),
    /// Projection plane to sphere, 2 → 3.
    Deproject(Projecter),
    /// True to distorted plane coordinates, 2 → 2.
    Distort(Distorter),
    /// Distorted to true plane coordinates, 2 → 2.
    UndoDistort(Distorter),
    /// Non-rotational sphere adjustment, 3 → 3.
    SphereDistort(SphereDistorter),
    /// Its inverse, 3 → 3.
    UndoSphereDistort(SphereDistorter),
}

impl Transform {
    pub fn input_dim(&self) -> usize {
        match self {
            Self::Rotate(_) | Self::SphereDistort(_) | Self::UndoSphereDistort(_) => 3,
            Self::Scale(_) | Self::Distort(_) | Self::UndoDistort(_) | Self::Deproject(_) => 2,
            Self::Project(_) => 3,
        }
    }

    pub fn output_dim(&self) -> usize {
        match self {
            Self::Rotate(_) | Self::SphereDistort(_) | Self::UndoSphereDistort(_) => 3,
            Self::Scale(_) | Self::Distort(_) | Self::UndoDistort(_) | Self::Project(_) => 2,
            Self::Deproject(_) => 3,
        }
    }

    /// Applies the step. `input` and `output` may be the same buffer
    /// on the caller's side; this reads fully before writing.
    pub fn apply(&self, input: &[f64; 3], output: &mut [f64; 3]) {
        match self {
            Self::Rotate(r) => {
                let v = r.apply(&Vector3::new(input[0], input[1], input[2]));
                *output = [v.x, v.y, v.z];
            }
            Self::SphereDistort(d) => {
                let v = Vector3::new(input[0], input[1], input[2]);
                let v = if v.is_finite() { d.apply(&v) } else { Vector3::nan() };
                *output = [v.x, v.y, v.z];
            }
            Self::UndoSphereDistort(d) => {
                let v = Vector3::new(input[0], input[1], input[2]);
                let v = if v.is_finite() { d.undo(&v) } else { Vector3::nan() };
                *output = [v.x, v.y, v.z];
            }
            Self::Scale(s) => {
                let p = s.apply(Vector2::new(input[0], input[1]));
                *output = [p.x, p.y, 0.0];
            }
            Self::Distort(d) => {
                let p = d.apply(Vector2::new(input[0], input[1]));
                *output = [p.x, p.y, 0.0];
            }
            Self::UndoDistort(d) => {
                let p = d.undo(Vector2::new(input[0], input[1]));
                *output = [p.x, p.y, 0.0];
            }
            Self::Project(proj) => {
                let p = proj.project(&Vector3::new(input[0], input[1], input[2]));
                *output = [p.x, p.y, 0.0];
            }
            Self::Deproject(proj) => {
                let v = proj.deproject(Vector2::new(input[0], input[1]));
                *output = [v.x, v.y, v.z];
            }
        }
    }

    /// The step running the other way. Only a degenerate plane affine
    /// fails.
    pub fn inverse(&self) -> WcsResult<Transform> {
        Ok(match self {
            Self::Rotate(r) => Self::Rotate(r.inverse()),
            Self::Scale(s) => Self::Scale(s.inverse()?),
            Self::Project(p) => Self::Deproject(p.clone()),
            Self::Deproject(p) => Self::Project(p.clone()),
            Self::Distort(d) => Self::UndoDistort(d.clone()),
            Self::UndoDistort(d) => Self::Distort(d.clone()),
            Self::SphereDistort(d) => Self::UndoSphereDistort(*d),
            Self::UndoSphereDistort(d) => Self::SphereDistort(*d),
        })
    }

    /// True when composing with `other` is the identity, which lets a
    /// chain drop the pair.
    pub fn is_inverse_of(&self, other: &Transform) -> bool {
        match (self, other) {
            (Self::Rotate(a), Self::Rotate(b)) => a.is_inverse_of(b),
            (Self::Scale(a), Self::Scale(b)) => a.is_inverse_of(b),
            (Self::Project(a), Self::Deproject(b)) | (Self::Deproject(a), Self::Project(b)) => {
                a == b
            }
            (Self::Distort(a), Self::UndoDistort(b))
            | (Self::UndoDistort(a), Self::Distort(b)) => a == b,
            (Self::SphereDistort(a), Self::UndoSphereDistort(b))
            | (Self::UndoSphereDistort(a), Self::SphereDistort(b)) => a == b,
            _ => false,
        }
    }
}

/// Composite transform: the steps applied in order, with dimension
/// checks at assembly time.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    steps: Vec<Transform>,
}

impl Converter {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    #[inline]
    pub fn steps(&self) -> &[Transform] {
        &self.steps
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.steps.first().map(Transform::input_dim)
    }

    pub fn output_dim(&self) -> Option<usize> {
        self.steps.last().map(Transform::output_dim)
    }

    /// Appends a step; its input dimension must match the chain's
    /// current output.
    pub fn add(&mut self, step: Transform) -> WcsResult<()> {
        if let Some(out) = self.output_dim() {
            if out != step.input_dim() {
                return Err(WcsError::incompatible_dimensions(out, step.input_dim()));
            }
        }
        self.steps.push(step);
        Ok(())
    }

    /// Appends every step of `other`, with the same dimension check
    /// at the seam.
    pub fn splice(&mut self, other: &Converter) -> WcsResult<()> {
        for step in &other.steps {
            self.add(step.clone())?;
        }
        Ok(())
    }

    /// Runs the chain over one point.
    pub fn apply(&self, input: &[f64; 3], output: &mut [f64; 3]) {
        let mut a = *input;
        let mut b = [0.0; 3];
        for step in &self.steps {
            step.apply(&a, &mut b);
            a = b;
        }
        *output = a;
    }

    /// Convenience wrapper for 2D-in, 2D-out chains.
    pub fn apply_plane(&self, p: Vector2) -> Vector2 {
        let mut out = [0.0; 3];
        self.apply(&[p.x, p.y, 0.0], &mut out);
        Vector2::new(out[0], out[1])
    }

    /// Drops adjacent mutually-inverse steps and merges runs of
    /// rotations and of affines. Cancelling a pair can bring two more
    /// cancellable steps together, so the scan restarts after every
    /// reduction.
    pub fn simplify(&mut self) {
        enum Reduction {
            Cancel,
            Merge(Transform),
        }
        loop {
            let mut changed = false;
            let mut i = 0;
            while i + 1 < self.steps.len() {
                let reduction = match (&self.steps[i], &self.steps[i + 1]) {
                    (a, b) if a.is_inverse_of(b) => Some(Reduction::Cancel),
                    (Transform::Rotate(a), Transform::Rotate(b)) => {
                        Some(Reduction::Merge(Transform::Rotate(a.add(b))))
                    }
                    (Transform::Scale(a), Transform::Scale(b)) => {
                        Some(Reduction::Merge(Transform::Scale(a.add(b))))
                    }
                    _ => None,
                };
                match reduction {
                    Some(Reduction::Cancel) => {
                        self.steps.drain(i..i + 2);
                        changed = true;
                        break;
                    }
                    Some(Reduction::Merge(step)) => {
                        self.steps[i] = step;
                        self.steps.remove(i + 1);
                        changed = true;
                        break;
                    }
                    None => i += 1,
                }
            }
            if !changed {
                return;
            }
        }
    }

    /// The chain running the other way: inverted steps in reverse
    /// order.
    pub fn inverse(&self) -> WcsResult<Converter> {
        let mut steps = Vec::with_capacity(self.steps.len());
        for step in self.steps.iter().rev() {
            steps.push(step.inverse()?);
        }
        Ok(Converter { steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_core::constants::{DEG_TO_RAD, HALF_PI};

    fn tan_at_origin() -> Converter {
        let mut c = Converter::new();
        c.add(Transform::Rotate(
            Rotater::new("ZY", 0.0, HALF_PI, 0.0).unwrap(),
        ))
        .unwrap();
        c.add(Transform::Project(Projecter::Tan)).unwrap();
        c.add(Transform::Scale(Scaler::new(
            50.0, 50.0, 3600.0, 0.0, 0.0, 3600.0,
        )))
        .unwrap();
        c
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut c = Converter::new();
        c.add(Transform::Project(Projecter::Tan)).unwrap();
        let err = c.add(Transform::Rotate(Rotater::identity()));
        assert!(matches!(
            err,
            Err(WcsError::IncompatibleDimensions {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn chain_maps_reference_to_pixel_offset() {
        let c = tan_at_origin();
        let mut out = [0.0; 3];
        c.apply(&[1.0, 0.0, 0.0], &mut out);
        assert!((out[0] - 50.0).abs() < 1e-9 && (out[1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn inverse_runs_the_chain_backwards() {
        let c = tan_at_origin();
        let inv = c.inverse().unwrap();
        let v = Vector3::from_spherical(0.7 * DEG_TO_RAD, -0.4 * DEG_TO_RAD);
        let mut px = [0.0; 3];
        c.apply(&[v.x, v.y, v.z], &mut px);
        let mut back = [0.0; 3];
        inv.apply(&px, &mut back);
        let b = Vector3::new(back[0], back[1], back[2]);
        assert!((b - v).magnitude() < 1e-12);
    }

    #[test]
    fn nan_rides_through_the_chain() {
        let c = tan_at_origin();
        let mut out = [0.0; 3];
        // The anti-reference direction has no gnomonic image.
        c.apply(&[-1.0, 0.0, 0.0], &mut out);
        assert!(out[0].is_nan() && out[1].is_nan());
    }

    #[test]
    fn simplify_cancels_inverse_pairs() {
        let c = tan_at_origin();
        let mut round = c.clone();
        round.splice(&c.inverse().unwrap()).unwrap();
        assert_eq!(round.steps().len(), 6);
        round.simplify();
        // Everything cancels down to a near-identity rotation pair
        // merged away and so on; the chain empties entirely.
        assert!(round.is_empty());
    }

    #[test]
    fn simplify_merges_rotation_runs() {
        let mut c = Converter::new();
        c.add(Transform::Rotate(Rotater::new("Z", 0.3, 0.0, 0.0).unwrap()))
            .unwrap();
        c.add(Transform::Rotate(Rotater::new("Z", -0.1, 0.0, 0.0).unwrap()))
            .unwrap();
        c.add(Transform::Rotate(Rotater::new("Y", 0.2, 0.0, 0.0).unwrap()))
            .unwrap();
        c.simplify();
        assert_eq!(c.steps().len(), 1);
        let direct = Rotater::new("ZZY", 0.3, -0.1, 0.2).unwrap();
        match &c.steps()[0] {
            Transform::Rotate(r) => assert!(r.is_inverse_of(&direct.inverse())),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn simplify_merges_scaler_runs_and_drops_identity_pairs() {
        let s = Scaler::new(2.0, -3.0, 1.5, 0.0, 0.0, 1.5);
        let mut c = Converter::new();
        c.add(Transform::Scale(s)).unwrap();
        c.add(Transform::Scale(s.inverse().unwrap())).unwrap();
        c.add(Transform::Scale(Scaler::new(1.0, 1.0, 2.0, 0.0, 0.0, 2.0)))
            .unwrap();
        c.simplify();
        assert_eq!(c.steps().len(), 1);
    }

    #[test]
    fn sphere_distorter_steps_invert() {
        let t = Transform::SphereDistort(SphereDistorter::ETerms);
        let inv = t.inverse().unwrap();
        assert!(t.is_inverse_of(&inv));
        let v = Vector3::from_spherical(1.2, 0.5);
        let mut a = [0.0; 3];
        let mut b = [0.0; 3];
        t.apply(&[v.x, v.y, v.z], &mut a);
        inv.apply(&a, &mut b);
        let back = Vector3::new(b[0], b[1], b[2]);
        assert!((back - v).magnitude() < 1e-11);
    }
}
