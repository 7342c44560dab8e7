//! Celestial coordinate systems and the rotations between them.
//!
//! Every system is expressed as a rotation from the J2000 equatorial
//! frame (the internal reference). Besselian systems additionally
//! carry a sphere distorter for the FK4 elliptic aberration terms,
//! which are a position-dependent shift and not a rotation.

use skygrid_core::constants::{ARCSEC_TO_RAD, DAYS_PER_JULIAN_YEAR, DEG_TO_RAD};
use skygrid_core::utils::normalize_degrees;
use skygrid_core::{Matrix3, Vector3};

use crate::error::{WcsError, WcsResult};
use crate::rotater::Rotater;

/// ICRS to galactic rotation (Hipparcos definition of the galactic
/// pole and zero longitude).
const GALACTIC: [[f64; 3]; 3] = [
    [-0.054_875_560_416_215_4, -0.873_437_090_234_885_0, -0.483_835_015_548_713_2],
    [0.494_109_427_875_583_7, -0.444_829_629_960_011_2, 0.746_982_244_497_218_9],
    [-0.867_666_149_019_004_7, -0.198_076_373_431_201_5, 0.455_983_776_175_066_9],
];

/// FK4 B1950 to FK5 J2000 equatorial rotation (Standish/Aoki).
const FK4_TO_FK5: [[f64; 3]; 3] = [
    [0.999_925_678_2, -0.011_182_061_1, -0.004_857_947_7],
    [0.011_182_061_0, 0.999_937_478_4, -0.000_027_176_5],
    [0.004_857_947_9, -0.000_027_147_4, 0.999_988_199_7],
];

/// FK4 elliptic aberration (e-term) vector in radians, equatorial
/// B1950 axes.
const E_TERMS: Vector3 = Vector3::new(-1.62557e-6, -0.31919e-6, -0.13843e-6);

/// Position-dependent sphere-to-sphere adjustments that are not
/// rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SphereDistorter {
    /// Add/remove the FK4 e-terms of aberration.
    ETerms,
}

impl SphereDistorter {
    /// Mean place to catalog place: adds the e-terms.
    pub fn apply(&self, v: &Vector3) -> Vector3 {
        match self {
            Self::ETerms => {
                let w = *v + E_TERMS - *v * v.dot(&E_TERMS);
                w.normalized()
            }
        }
    }

    /// Catalog place to mean place: removes the e-terms.
    pub fn undo(&self, v: &Vector3) -> Vector3 {
        match self {
            Self::ETerms => {
                // The removal is the fixed point of w = v - e + (w·e)w;
                // two passes are ample at e ~ 1.7e-6.
                let mut w = *v;
                for _ in 0..2 {
                    w = *v - E_TERMS + w * w.dot(&E_TERMS);
                    w = w.normalized();
                }
                w
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// FK5-style mean equator and equinox of a Julian epoch.
    Julian,
    /// FK4-style mean equator and equinox of a Besselian epoch.
    Besselian,
    /// Mean ecliptic and equinox of a Julian epoch.
    Ecliptic,
    /// Ecliptic longitude measured from the mean Sun at the epoch.
    Helioecliptic,
    Galactic,
    Icrs,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    frame: Frame,
    epoch: f64,
}

impl CoordinateSystem {
    pub fn julian(epoch: f64) -> Self {
        Self {
            frame: Frame::Julian,
            epoch,
        }
    }

    pub fn besselian(epoch: f64) -> Self {
        Self {
            frame: Frame::Besselian,
            epoch,
        }
    }

    pub fn ecliptic(epoch: f64) -> Self {
        Self {
            frame: Frame::Ecliptic,
            epoch,
        }
    }

    pub fn helioecliptic(epoch: f64) -> Self {
        Self {
            frame: Frame::Helioecliptic,
            epoch,
        }
    }

    pub fn galactic() -> Self {
        Self {
            frame: Frame::Galactic,
            epoch: 2000.0,
        }
    }

    pub fn icrs() -> Self {
        Self {
            frame: Frame::Icrs,
            epoch: 2000.0,
        }
    }

    /// Parses designations like `J2000`, `B1950.5`, `E2000`, `H2024.3`,
    /// `G`, `ICRS`. A bare letter takes the frame's customary epoch.
    pub fn from_name(name: &str) -> WcsResult<Self> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("icrs") {
            return Ok(Self::icrs());
        }
        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .ok_or_else(|| WcsError::unknown_coordinate_system(name))?;
        let rest = chars.as_str().trim();
        let epoch = |default: f64| -> WcsResult<f64> {
            if rest.is_empty() {
                Ok(default)
            } else {
                rest.parse()
                    .map_err(|_| WcsError::unknown_coordinate_system(name))
            }
        };
        match letter.to_ascii_uppercase() {
            'J' => Ok(Self::julian(epoch(2000.0)?)),
            'B' => Ok(Self::besselian(epoch(1950.0)?)),
            'E' => Ok(Self::ecliptic(epoch(2000.0)?)),
            'H' => Ok(Self::helioecliptic(epoch(2000.0)?)),
            'G' if rest.is_empty() => Ok(Self::galactic()),
            'I' if rest.is_empty() => Ok(Self::icrs()),
            _ => Err(WcsError::unknown_coordinate_system(name)),
        }
    }

    #[inline]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    #[inline]
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    pub fn name(&self) -> String {
        let fmt = |e: f64| {
            if e.fract() == 0.0 {
                format!("{e:.0}")
            } else {
                format!("{e}")
            }
        };
        match self.frame {
            Frame::Julian => format!("J{}", fmt(self.epoch)),
            Frame::Besselian => format!("B{}", fmt(self.epoch)),
            Frame::Ecliptic => format!("E{}", fmt(self.epoch)),
            Frame::Helioecliptic => format!("H{}", fmt(self.epoch)),
            Frame::Galactic => "G".to_owned(),
            Frame::Icrs => "ICRS".to_owned(),
        }
    }

    /// CTYPE longitude/latitude axis prefixes for this frame.
    pub fn ctype_prefixes(&self) -> (&'static str, &'static str) {
        match self.frame {
            Frame::Julian | Frame::Besselian | Frame::Icrs => ("RA--", "DEC-"),
            Frame::Ecliptic => ("ELON", "ELAT"),
            Frame::Helioecliptic => ("HLON", "HLAT"),
            Frame::Galactic => ("GLON", "GLAT"),
        }
    }

    /// The rotation carrying J2000 equatorial directions into this
    /// system.
    pub fn rotater(&self) -> Rotater {
        match self.frame {
            Frame::Julian => Rotater::from_matrix(precession_iau1976(self.epoch)),
            Frame::Besselian => {
                let to_b1950 = Matrix3::from_rows(FK4_TO_FK5).transpose();
                Rotater::from_matrix(precession_newcomb(self.epoch).multiply(&to_b1950))
            }
            Frame::Ecliptic => {
                let mut m = precession_iau1976(self.epoch);
                m.rotate_x(mean_obliquity(self.epoch));
                Rotater::from_matrix(m)
            }
            Frame::Helioecliptic => {
                let mut m = precession_iau1976(self.epoch);
                m.rotate_x(mean_obliquity(self.epoch));
                m.rotate_z(solar_mean_longitude(self.epoch));
                Rotater::from_matrix(m)
            }
            Frame::Galactic => Rotater::from_matrix(Matrix3::from_rows(GALACTIC)),
            Frame::Icrs => frame_bias(),
        }
    }

    /// The e-term distorter for Besselian systems, None elsewhere.
    pub fn sphere_distorter(&self) -> Option<SphereDistorter> {
        match self.frame {
            Frame::Besselian => Some(SphereDistorter::ETerms),
            _ => None,
        }
    }
}

/// IAU 1976 precession from J2000 to the mean equator and equinox of
/// a Julian epoch.
fn precession_iau1976(epoch: f64) -> Matrix3 {
    let t = (epoch - 2000.0) / 100.0;
    let zeta = (2306.2181 + (0.30188 + 0.017998 * t) * t) * t * ARCSEC_TO_RAD;
    let z = (2306.2181 + (1.09468 + 0.018203 * t) * t) * t * ARCSEC_TO_RAD;
    let theta = (2004.3109 - (0.42665 + 0.041833 * t) * t) * t * ARCSEC_TO_RAD;
    let mut m = Matrix3::identity();
    m.rotate_z(-zeta);
    m.rotate_y(theta);
    m.rotate_z(-z);
    m
}

/// Newcomb precession from B1950 to the mean equator and equinox of a
/// Besselian epoch.
fn precession_newcomb(epoch: f64) -> Matrix3 {
    let tau = (epoch - 1950.0) / 100.0;
    let zeta = (2304.250 + (0.302 + 0.018 * tau) * tau) * tau * ARCSEC_TO_RAD;
    let z = zeta + 0.791 * tau * tau * ARCSEC_TO_RAD;
    let theta = (2004.682 - (0.853 + 0.042 * tau) * tau) * tau * ARCSEC_TO_RAD;
    let mut m = Matrix3::identity();
    m.rotate_z(-zeta);
    m.rotate_y(theta);
    m.rotate_z(-z);
    m
}

/// IAU 1980 mean obliquity of the ecliptic at a Julian epoch.
fn mean_obliquity(epoch: f64) -> f64 {
    let t = (epoch - 2000.0) / 100.0;
    (84381.448 - (46.8150 + (0.00059 - 0.001813 * t) * t) * t) * ARCSEC_TO_RAD
}

/// Mean longitude of the Sun at a (decimal-year) epoch; low-precision
/// series, plenty for aiming a helioecliptic frame.
fn solar_mean_longitude(epoch: f64) -> f64 {
    let d = (epoch - 2000.0) * DAYS_PER_JULIAN_YEAR;
    normalize_degrees(280.460 + 0.985_647_4 * d) * DEG_TO_RAD
}

/// J2000 to ICRS frame bias, a sub-milliarcsecond rigid rotation.
fn frame_bias() -> Rotater {
    const D_EPS: f64 = -0.0068192;
    const D_PSI_SIN_EPS: f64 = -0.041775 * 0.397_777_155_931_913_7;
    const D_RA0: f64 = -0.0146;
    Rotater::new(
        "XYZ",
        D_EPS * ARCSEC_TO_RAD,
        -D_PSI_SIN_EPS * ARCSEC_TO_RAD,
        -D_RA0 * ARCSEC_TO_RAD,
    )
    .unwrap_or_else(|_| Rotater::identity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygrid_core::constants::RAD_TO_ARCSEC;

    #[test]
    fn parses_standard_names() {
        assert_eq!(
            CoordinateSystem::from_name("J2000").unwrap(),
            CoordinateSystem::julian(2000.0)
        );
        assert_eq!(
            CoordinateSystem::from_name("b1950").unwrap(),
            CoordinateSystem::besselian(1950.0)
        );
        assert_eq!(
            CoordinateSystem::from_name("J").unwrap().epoch(),
            2000.0
        );
        assert_eq!(
            CoordinateSystem::from_name("B").unwrap().epoch(),
            1950.0
        );
        assert_eq!(
            CoordinateSystem::from_name(" ICRS ").unwrap().frame(),
            Frame::Icrs
        );
        assert_eq!(
            CoordinateSystem::from_name("G").unwrap().frame(),
            Frame::Galactic
        );
        assert!(CoordinateSystem::from_name("Q123").is_err());
        assert!(CoordinateSystem::from_name("Jxyz").is_err());
    }

    #[test]
    fn names_round_trip() {
        for name in ["J2000", "B1950", "E2000", "H2024.5", "G", "ICRS", "J1987.25"] {
            let sys = CoordinateSystem::from_name(name).unwrap();
            assert_eq!(
                CoordinateSystem::from_name(&sys.name()).unwrap(),
                sys,
                "{name}"
            );
        }
    }

    #[test]
    fn j2000_rotation_is_identity() {
        assert!(CoordinateSystem::julian(2000.0).rotater().is_identity());
    }

    #[test]
    fn precession_half_century_magnitude() {
        // ζ at J2050 is about 1153 arcsec; the equinox point moves by
        // roughly ζ + z in longitude.
        let r = CoordinateSystem::julian(2050.0).rotater();
        let v = r.apply(&Vector3::new(1.0, 0.0, 0.0));
        let (lon, _) = v.to_spherical();
        let shift = (skygrid_core::constants::TWO_PI - lon) * RAD_TO_ARCSEC;
        assert!((shift - 2306.0).abs() < 10.0, "shift {shift}");
    }

    #[test]
    fn galactic_pole_maps_to_z() {
        let r = CoordinateSystem::galactic().rotater();
        let ngp = Vector3::from_spherical(192.85948 * DEG_TO_RAD, 27.12825 * DEG_TO_RAD);
        let v = r.apply(&ngp);
        assert!((v.z - 1.0).abs() < 1e-9, "{v:?}");
    }

    #[test]
    fn galactic_center_is_origin() {
        let r = CoordinateSystem::galactic().rotater();
        let sgr = Vector3::from_spherical(266.405 * DEG_TO_RAD, -28.936 * DEG_TO_RAD);
        let v = r.apply(&sgr);
        let (lon, lat) = v.to_spherical();
        let lon = skygrid_core::utils::normalize_angle(lon);
        assert!(lon.abs() < 1e-3 && lat.abs() < 1e-3, "({lon}, {lat})");
    }

    #[test]
    fn b1950_matches_catalog_positions() {
        // J2000 (0h, 0°) is near B1950 RA 23h57m, Dec -0°16'.
        let r = CoordinateSystem::besselian(1950.0).rotater();
        let v = r.apply(&Vector3::new(1.0, 0.0, 0.0));
        let (lon, lat) = v.to_spherical();
        let lon_deg = lon * 180.0 / std::f64::consts::PI;
        let lat_deg = lat * 180.0 / std::f64::consts::PI;
        assert!((lon_deg - 359.359).abs() < 0.01, "{lon_deg}");
        assert!((lat_deg + 0.278).abs() < 0.01, "{lat_deg}");
    }

    #[test]
    fn icrs_bias_is_tiny_but_nonzero() {
        let r = CoordinateSystem::icrs().rotater();
        let v = r.apply(&Vector3::new(1.0, 0.0, 0.0));
        let offset = (v - Vector3::new(1.0, 0.0, 0.0)).magnitude() * RAD_TO_ARCSEC;
        assert!(offset > 1e-4 && offset < 0.1, "offset {offset}");
    }

    #[test]
    fn eterms_round_trip() {
        let d = SphereDistorter::ETerms;
        let v = Vector3::from_spherical(1.9, -0.7);
        let shifted = d.apply(&v);
        let delta = (shifted - v).magnitude() * RAD_TO_ARCSEC;
        // E-terms are a few tenths of an arcsecond.
        assert!(delta > 0.05 && delta < 0.5, "delta {delta}");
        let back = d.undo(&shifted);
        assert!((back - v).magnitude() * RAD_TO_ARCSEC < 1e-6);
    }

    #[test]
    fn besselian_systems_carry_the_distorter() {
        assert_eq!(
            CoordinateSystem::besselian(1950.0).sphere_distorter(),
            Some(SphereDistorter::ETerms)
        );
        assert_eq!(CoordinateSystem::julian(2000.0).sphere_distorter(), None);
        assert_eq!(CoordinateSystem::galactic().sphere_distorter(), None);
    }
}
