//! Map projection catalog.
//!
//! A [`Projecter`] is the pure plane↔sphere mapping in its native
//! frame; a [`Projection`] binds one to a sky reference point through
//! a [`Rotater`]. Per-point domain failures yield NaN coordinates
//! rather than errors.

mod cylindrical;
mod healpix;
mod octahedral;
mod pseudocylindrical;
mod quadcube;
pub(crate) mod straddle;
mod zenithal;

use skygrid_core::constants::{HALF_PI, PI, TWO_PI};
use skygrid_core::{Vector2, Vector3};

use crate::error::{WcsError, WcsResult};
use crate::rotater::Rotater;

/// The supported plane↔sphere mappings.
///
/// Zenithal projections (`Tan`, `Sin`, `Zea`, `Arc`, `Stg`) center on
/// the native pole and are re-aimed at any sky position; the rest are
/// fixed whole-sky layouts centered on (lon 0, lat 0).
#[derive(Debug, Clone, PartialEq)]
pub enum Projecter {
    Tan,
    /// Slant orthographic; `xi = eta = 0` is plain SIN.
    Sin { xi: f64, eta: f64 },
    Zea,
    Arc,
    Stg,
    Car,
    Mer,
    Sfl,
    Ait,
    Csc,
    Hpx,
    Toa,
    Tea,
}

impl Projecter {
    /// Case-insensitive lookup by the three-letter code. `GLS` is the
    /// historical alias for `Sfl`.
    pub fn from_name(name: &str) -> WcsResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tan" => Ok(Self::Tan),
            "sin" => Ok(Self::Sin { xi: 0.0, eta: 0.0 }),
            "zea" => Ok(Self::Zea),
            "arc" => Ok(Self::Arc),
            "stg" => Ok(Self::Stg),
            "car" => Ok(Self::Car),
            "mer" => Ok(Self::Mer),
            "sfl" | "gls" => Ok(Self::Sfl),
            "ait" => Ok(Self::Ait),
            "csc" => Ok(Self::Csc),
            "hpx" => Ok(Self::Hpx),
            "toa" => Ok(Self::Toa),
            "tea" => Ok(Self::Tea),
            _ => Err(WcsError::unsupported_projection(name)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tan => "Tan",
            Self::Sin { .. } => "Sin",
            Self::Zea => "Zea",
            Self::Arc => "Arc",
            Self::Stg => "Stg",
            Self::Car => "Car",
            Self::Mer => "Mer",
            Self::Sfl => "Sfl",
            Self::Ait => "Ait",
            Self::Csc => "Csc",
            Self::Hpx => "Hpx",
            Self::Toa => "Toa",
            Self::Tea => "Tea",
        }
    }

    /// Sphere to plane; NaN when the direction has no image.
    pub fn project(&self, v: &Vector3) -> Vector2 {
        match self {
            Self::Tan => zenithal::project_tan(v),
            Self::Sin { xi, eta } => zenithal::project_sin(v, *xi, *eta),
            Self::Zea => zenithal::project_zea(v),
            Self::Arc => zenithal::project_arc(v),
            Self::Stg => zenithal::project_stg(v),
            Self::Car => cylindrical::project_car(v),
            Self::Mer => cylindrical::project_mer(v),
            Self::Sfl => pseudocylindrical::project_sfl(v),
            Self::Ait => pseudocylindrical::project_ait(v),
            Self::Csc => quadcube::project_csc(v),
            Self::Hpx => healpix::project_hpx(v),
            Self::Toa => octahedral::project_toa(v),
            Self::Tea => octahedral::project_tea(v),
        }
    }

    /// Plane to sphere; NaN when the point is off the map.
    pub fn deproject(&self, p: Vector2) -> Vector3 {
        match self {
            Self::Tan => zenithal::deproject_tan(p),
            Self::Sin { xi, eta } => zenithal::deproject_sin(p, *xi, *eta),
            Self::Zea => zenithal::deproject_zea(p),
            Self::Arc => zenithal::deproject_arc(p),
            Self::Stg => zenithal::deproject_stg(p),
            Self::Car => cylindrical::deproject_car(p),
            Self::Mer => cylindrical::deproject_mer(p),
            Self::Sfl => pseudocylindrical::deproject_sfl(p),
            Self::Ait => pseudocylindrical::deproject_ait(p),
            Self::Csc => quadcube::deproject_csc(p),
            Self::Hpx => healpix::deproject_hpx(p),
            Self::Toa => octahedral::deproject_toa(p),
            Self::Tea => octahedral::deproject_tea(p),
        }
    }

    /// Whether a plane point lies on the map.
    pub fn plane_valid(&self, p: Vector2) -> bool {
        match self {
            Self::Tan | Self::Stg => p.is_finite(),
            Self::Sin { xi, eta } => p.is_finite() && zenithal::sin_plane_valid(p, *xi, *eta),
            Self::Zea => p.is_finite() && p.x * p.x + p.y * p.y <= 4.0,
            Self::Arc => p.is_finite() && p.x * p.x + p.y * p.y <= PI * PI,
            Self::Car => cylindrical::car_plane_valid(p),
            Self::Mer => cylindrical::mer_plane_valid(p),
            Self::Sfl => pseudocylindrical::sfl_plane_valid(p),
            Self::Ait => pseudocylindrical::ait_plane_valid(p),
            Self::Csc => quadcube::csc_plane_valid(p),
            Self::Hpx => healpix::hpx_plane_valid(p),
            Self::Toa => octahedral::toa_plane_valid(p),
            Self::Tea => octahedral::tea_plane_valid(p),
        }
    }

    /// True when every finite plane point is on the map, letting
    /// samplers skip per-pixel validity checks.
    pub fn all_plane_valid(&self) -> bool {
        matches!(self, Self::Tan | Self::Stg)
    }

    /// Horizontal tiling period of the map, if it repeats in x.
    pub fn tile_x(&self) -> Option<f64> {
        match self {
            Self::Car | Self::Mer | Self::Sfl | Self::Ait | Self::Toa | Self::Tea | Self::Hpx => {
                Some(TWO_PI)
            }
            _ => None,
        }
    }

    /// Vertical tiling period, if any.
    pub fn tile_y(&self) -> Option<f64> {
        match self {
            Self::Toa => Some(TWO_PI),
            _ => None,
        }
    }

    /// Whether the native center sits at (lon 0, lat 0) rather than
    /// at the pole.
    pub fn is_fixed(&self) -> bool {
        !matches!(
            self,
            Self::Tan | Self::Sin { .. } | Self::Zea | Self::Arc | Self::Stg
        )
    }

    /// Whether footprints crossing this map's cut get split into
    /// shadow components.
    pub fn straddleable(&self) -> bool {
        matches!(
            self,
            Self::Car | Self::Mer | Self::Ait | Self::Toa | Self::Tea
        )
    }

    /// True when the footprint wraps a cut.
    pub fn straddles(&self, pts: &[Vector2]) -> bool {
        straddle::straddles(self, pts)
    }

    /// Splits a footprint into per-side components; a non-straddling
    /// footprint comes back as a single component.
    pub fn straddle_components(&self, pts: &[Vector2]) -> Vec<Vec<Vector2>> {
        straddle::components(self, pts)
    }

    /// HEALPix nested pixel index at `order` for a plane point.
    /// `None` off the map or for any projecter but Hpx.
    pub fn pixel_index(&self, p: Vector2, order: u32) -> Option<u64> {
        match self {
            Self::Hpx => healpix::nested_index(p, order),
            _ => None,
        }
    }

    /// TOAST quadtree tile (column, row) at `level`. `None` off the
    /// map or for any projecter but Toa.
    pub fn tile_address(&self, p: Vector2, level: u32) -> Option<(u64, u64)> {
        match self {
            Self::Toa => octahedral::toa_tile_address(p, level),
            _ => None,
        }
    }
}

/// A projecter aimed at a sky position: the rotater carries the sky
/// frame into the projecter's native frame.
#[derive(Debug, Clone)]
pub struct Projection {
    projecter: Projecter,
    rotater: Option<Rotater>,
    reference: Option<(f64, f64)>,
    lonpole: Option<f64>,
}

impl Projection {
    /// A fixed projection in its natural position, no rotation.
    /// Zenithal projections need [`Projection::with_reference`].
    pub fn new(name: &str) -> WcsResult<Self> {
        let projecter = Projecter::from_name(name)?;
        if !projecter.is_fixed() {
            return Err(WcsError::invalid_geometry(format!(
                "projection {} needs a sky reference point",
                projecter.name()
            )));
        }
        Ok(Self {
            projecter,
            rotater: None,
            reference: None,
            lonpole: None,
        })
    }

    pub fn from_projecter(projecter: Projecter, rotater: Option<Rotater>) -> Self {
        Self {
            projecter,
            rotater,
            reference: None,
            lonpole: None,
        }
    }

    /// Aims the projection at `(lon, lat)` radians with the default
    /// native orientation.
    pub fn with_reference(name: &str, lon: f64, lat: f64) -> WcsResult<Self> {
        let projecter = Projecter::from_name(name)?;
        Self::bind(projecter, lon, lat, None)
    }

    /// As [`Projection::with_reference`] but with an explicit native
    /// longitude of the celestial pole (the LONPOLE convention).
    pub fn with_reference_lonpole(
        name: &str,
        lon: f64,
        lat: f64,
        lonpole: f64,
    ) -> WcsResult<Self> {
        let projecter = Projecter::from_name(name)?;
        Self::bind(projecter, lon, lat, Some(lonpole))
    }

    pub fn bind(
        projecter: Projecter,
        lon: f64,
        lat: f64,
        lonpole: Option<f64>,
    ) -> WcsResult<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(WcsError::invalid_geometry(format!(
                "non-finite reference position ({lon}, {lat})"
            )));
        }
        let rotater = if projecter.is_fixed() {
            // Carry the reference to (0, 0); the default celestial
            // pole direction is native lon 0.
            Rotater::new("ZYZ", lon, -lat, -lonpole.unwrap_or(0.0))?
        } else {
            // Carry the reference to the pole; the default pole
            // direction is native lon 180°.
            Rotater::new("ZYZ", lon, HALF_PI - lat, PI - lonpole.unwrap_or(PI))?
        };
        Ok(Self {
            projecter,
            rotater: Some(rotater),
            reference: Some((lon, lat)),
            lonpole,
        })
    }

    #[inline]
    pub fn projecter(&self) -> &Projecter {
        &self.projecter
    }

    #[inline]
    pub fn rotater(&self) -> Option<&Rotater> {
        self.rotater.as_ref()
    }

    /// The sky reference point this projection was aimed at, if any.
    #[inline]
    pub fn reference(&self) -> Option<(f64, f64)> {
        self.reference
    }

    /// The explicit native pole longitude, if one was given.
    #[inline]
    pub fn lonpole(&self) -> Option<f64> {
        self.lonpole
    }

    pub fn name(&self) -> &'static str {
        self.projecter.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_core::constants::DEG_TO_RAD;

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(Projecter::from_name("TAN").unwrap(), Projecter::Tan);
        assert_eq!(Projecter::from_name("hpx").unwrap(), Projecter::Hpx);
        assert_eq!(Projecter::from_name("GLS").unwrap(), Projecter::Sfl);
        assert!(matches!(
            Projecter::from_name("bogus"),
            Err(WcsError::UnsupportedProjection { .. })
        ));
    }

    #[test]
    fn every_projecter_round_trips_its_name() {
        for name in [
            "Tan", "Sin", "Zea", "Arc", "Stg", "Car", "Mer", "Sfl", "Ait", "Csc", "Hpx", "Toa",
            "Tea",
        ] {
            let p = Projecter::from_name(name).unwrap();
            assert_eq!(p.name(), name);
        }
    }

    #[test]
    fn zenithal_projection_requires_reference() {
        assert!(Projection::new("Tan").is_err());
        assert!(Projection::new("Car").is_ok());
    }

    #[test]
    fn reference_maps_to_plane_origin() {
        let lon = 187.5 * DEG_TO_RAD;
        let lat = -33.0 * DEG_TO_RAD;
        for name in ["Tan", "Sin", "Zea", "Arc", "Stg", "Car", "Mer", "Sfl", "Ait"] {
            let proj = Projection::with_reference(name, lon, lat).unwrap();
            let v = Vector3::from_spherical(lon, lat);
            let native = proj.rotater().unwrap().apply(&v);
            let p = proj.projecter().project(&native);
            assert!(
                p.x.abs() < 1e-12 && p.y.abs() < 1e-12,
                "{name}: {p:?}"
            );
        }
    }

    #[test]
    fn north_of_reference_is_plus_y_for_tan() {
        let lon = 10.0 * DEG_TO_RAD;
        let lat = 40.0 * DEG_TO_RAD;
        let proj = Projection::with_reference("Tan", lon, lat).unwrap();
        let v = Vector3::from_spherical(lon, lat + 0.001);
        let p = proj
            .projecter()
            .project(&proj.rotater().unwrap().apply(&v));
        assert!(p.y > 0.0 && p.x.abs() < 1e-9);

        // East (increasing lon) is +x in the native plane.
        let v = Vector3::from_spherical(lon + 0.001, lat);
        let p = proj
            .projecter()
            .project(&proj.rotater().unwrap().apply(&v));
        assert!(p.x > 0.0);
    }

    #[test]
    fn straddleable_set_matches_catalog() {
        for (name, expect) in [
            ("Car", true),
            ("Mer", true),
            ("Ait", true),
            ("Toa", true),
            ("Tea", true),
            ("Tan", false),
            ("Hpx", false),
            ("Csc", false),
            ("Sfl", false),
        ] {
            assert_eq!(
                Projecter::from_name(name).unwrap().straddleable(),
                expect,
                "{name}"
            );
        }
    }

    #[test]
    fn hpx_index_and_toa_tiles_are_exclusive() {
        assert!(Projecter::Tan.pixel_index(Vector2::new(0.0, 0.0), 3).is_none());
        assert!(Projecter::Hpx.pixel_index(Vector2::new(0.0, 0.0), 3).is_some());
        assert!(Projecter::Tea.tile_address(Vector2::new(0.0, 0.0), 3).is_none());
        assert!(Projecter::Toa.tile_address(Vector2::new(0.0, 0.0), 3).is_some());
    }
}
