//! The World Coordinate System: a transform chain from J2000 sky
//! directions to pixel coordinates, plus the FITS-style header
//! conventions for building and re-emitting one.
//!
//! The forward chain runs sphere distorter, frame rotation,
//! projection rotation, projecter, plane distorter, scaler. Pixel
//! coordinates are 0-based with pixel centers at half-integers; FITS
//! CRPIX values are shifted by 0.5 on the way in and out.

use skygrid_core::constants::{DEG_TO_RAD, HOUR_TO_DEG, RAD_TO_DEG};
use skygrid_core::{Vector2, Vector3};
use tracing::debug;

use crate::coordsys::{CoordinateSystem, Frame};
use crate::distortion::{Distorter, PlateDistorter, ScanDistorter};
use crate::error::{WcsError, WcsResult};
use crate::header::{KeywordMap, KeywordProvider};
use crate::projection::{Projecter, Projection};
use crate::scaler::Scaler;
use crate::transform::{Converter, Transform};

/// Cross-term magnitude (degrees) below which a pixel matrix is
/// written back as CDELT instead of CD.
const CD_CROSS_TERM_THRESHOLD: f64 = 1e-14;

const LON_PREFIXES: [&str; 4] = ["RA--", "GLON", "ELON", "HLON"];
const LAT_PREFIXES: [&str; 4] = ["DEC-", "GLAT", "ELAT", "HLAT"];

#[derive(Debug, Clone)]
pub struct Wcs {
    system: CoordinateSystem,
    projection: Projection,
    scaler: Scaler,
    distorter: Option<Distorter>,
    forward: Converter,
    backward: Converter,
    nominal_scale: f64,
    captured: KeywordMap,
}

impl Wcs {
    /// Builds a WCS from an explicit system/projection/scaling triple.
    /// The scaler maps projection-plane radians to pixels.
    pub fn new(
        system: CoordinateSystem,
        projection: Projection,
        scaler: Scaler,
    ) -> WcsResult<Self> {
        Self::assemble(system, projection, scaler, None, KeywordMap::new())
    }

    fn assemble(
        system: CoordinateSystem,
        projection: Projection,
        scaler: Scaler,
        distorter: Option<Distorter>,
        captured: KeywordMap,
    ) -> WcsResult<Self> {
        let mut forward = Converter::new();
        if let Some(d) = system.sphere_distorter() {
            forward.add(Transform::SphereDistort(d))?;
        }
        let frame = system.rotater();
        if !frame.is_identity() {
            forward.add(Transform::Rotate(frame))?;
        }
        if let Some(r) = projection.rotater() {
            forward.add(Transform::Rotate(r.clone()))?;
        }
        forward.add(Transform::Project(projection.projecter().clone()))?;
        if let Some(d) = &distorter {
            forward.add(Transform::Distort(d.clone()))?;
        }
        forward.add(Transform::Scale(scaler))?;
        forward.simplify();
        let mut backward = forward.inverse()?;
        backward.simplify();
        let nominal_scale = scaler.scale();
        Ok(Self {
            system,
            projection,
            scaler,
            distorter,
            forward,
            backward,
            nominal_scale,
            captured,
        })
    }

    #[inline]
    pub fn system(&self) -> &CoordinateSystem {
        &self.system
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[inline]
    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    #[inline]
    pub fn distorter(&self) -> Option<&Distorter> {
        self.distorter.as_ref()
    }

    /// The simplified sky-to-pixel chain.
    #[inline]
    pub fn converter(&self) -> &Converter {
        &self.forward
    }

    /// The simplified pixel-to-sky chain.
    #[inline]
    pub fn inverse_converter(&self) -> &Converter {
        &self.backward
    }

    /// Pixels per radian, the geometric mean of the axis scalings.
    #[inline]
    pub fn nominal_scale(&self) -> f64 {
        self.nominal_scale
    }

    /// Header keywords captured when this WCS was decoded; empty for
    /// an explicitly built one.
    #[inline]
    pub fn captured_keywords(&self) -> &KeywordMap {
        &self.captured
    }

    pub fn sky_to_pixel(&self, v: &Vector3) -> Vector2 {
        let mut out = [0.0; 3];
        self.forward.apply(&[v.x, v.y, v.z], &mut out);
        Vector2::new(out[0], out[1])
    }

    pub fn pixel_to_sky(&self, p: Vector2) -> Vector3 {
        let mut out = [0.0; 3];
        self.backward.apply(&[p.x, p.y, 0.0], &mut out);
        Vector3::new(out[0], out[1], out[2])
    }

    /// The head of the forward chain, up to and including the
    /// projection step.
    pub fn sky_to_plane(&self) -> WcsResult<Converter> {
        let split = self.projection_split();
        let mut c = Converter::new();
        for step in &self.forward.steps()[..split] {
            c.add(step.clone())?;
        }
        Ok(c)
    }

    /// The tail of the forward chain after the projection step:
    /// projection plane to pixels.
    pub fn plane_to_pixel(&self) -> WcsResult<Converter> {
        let split = self.projection_split();
        let mut c = Converter::new();
        for step in &self.forward.steps()[split..] {
            c.add(step.clone())?;
        }
        Ok(c)
    }

    fn projection_split(&self) -> usize {
        self.forward
            .steps()
            .iter()
            .position(|s| matches!(s, Transform::Project(_)))
            .map(|i| i + 1)
            .unwrap_or(self.forward.steps().len())
    }

    /// The chain from one WCS's pixels to another's, with the shared
    /// middle cancelled where the geometries agree.
    pub fn pixel_mapper(from: &Wcs, to: &Wcs) -> WcsResult<Converter> {
        let mut mapper = from.backward.clone();
        mapper.splice(&to.forward)?;
        mapper.simplify();
        Ok(mapper)
    }

    /// Decodes a header, trying the plate-solution and fixed-pattern
    /// conventions before standard FITS WCS.
    pub fn from_header(header: &impl KeywordProvider) -> WcsResult<Self> {
        if is_plate(header) {
            decode_plate(header)
        } else if is_scanned(header) {
            decode_scanned(header)
        } else {
            decode_standard(header)
        }
    }

    /// Re-derives the geometry keywords from live state and merges
    /// them over the captured originals.
    pub fn to_keywords(&self) -> WcsResult<KeywordMap> {
        let mut out = self.captured.clone();
        let (plon, plat) = self.system.ctype_prefixes();
        let code = self.projection.name().to_ascii_uppercase();
        out.set_string("CTYPE1", format!("{plon}-{code}"));
        out.set_string("CTYPE2", format!("{plat}-{code}"));

        let (lon, lat) = self.projection.reference().unwrap_or((0.0, 0.0));
        out.set_float("CRVAL1", lon * RAD_TO_DEG);
        out.set_float("CRVAL2", lat * RAD_TO_DEG);
        let (x0, y0) = self.scaler.offset();
        out.set_float("CRPIX1", x0 + 0.5);
        out.set_float("CRPIX2", y0 + 0.5);

        // The header convention is pixel-to-sky, in degrees.
        let inv = self.scaler.inverse()?;
        let [m00, m01, m10, m11] = inv.matrix();
        let (m00, m01, m10, m11) = (
            m00 * RAD_TO_DEG,
            m01 * RAD_TO_DEG,
            m10 * RAD_TO_DEG,
            m11 * RAD_TO_DEG,
        );
        for k in [
            "CD1_1", "CD1_2", "CD2_1", "CD2_2", "PC1_1", "PC1_2", "PC2_1", "PC2_2", "CDELT1",
            "CDELT2", "CROTA2",
        ] {
            out.remove(k);
        }
        if m01.abs() < CD_CROSS_TERM_THRESHOLD && m10.abs() < CD_CROSS_TERM_THRESHOLD {
            out.set_float("CDELT1", m00);
            out.set_float("CDELT2", m11);
        } else {
            out.set_float("CD1_1", m00);
            out.set_float("CD1_2", m01);
            out.set_float("CD2_1", m10);
            out.set_float("CD2_2", m11);
        }

        match self.system.frame() {
            Frame::Julian => {
                out.set_string("RADESYS", "FK5");
                out.set_float("EQUINOX", self.system.epoch());
            }
            Frame::Besselian => {
                out.set_string("RADESYS", "FK4");
                out.set_float("EQUINOX", self.system.epoch());
            }
            Frame::Icrs => out.set_string("RADESYS", "ICRS"),
            Frame::Ecliptic | Frame::Helioecliptic => {
                out.set_float("EQUINOX", self.system.epoch());
            }
            Frame::Galactic => {}
        }
        if let Some(lp) = self.projection.lonpole() {
            out.set_float("LONPOLE", lp * RAD_TO_DEG);
        }
        Ok(out)
    }
}

fn is_plate(header: &impl KeywordProvider) -> bool {
    let origin_matches = header
        .get_string("ORIGIN")
        .map(|o| {
            let o = o.to_ascii_uppercase();
            o.contains("STSCI") || o.contains("CASB") || o.contains("ROE")
        })
        .unwrap_or(false);
    (origin_matches || header.contains("PLTSCALE"))
        && header.contains("PLTRAH")
        && header.contains("PPO3")
}

fn is_scanned(header: &impl KeywordProvider) -> bool {
    header
        .get_string("CTYPE1")
        .map(|s| s.trim() == "RA---XTN")
        .unwrap_or(false)
}

fn capture(header: &impl KeywordProvider, keywords: &[String]) -> KeywordMap {
    let mut map = KeywordMap::new();
    for k in keywords {
        if let Some(v) = header.value(k) {
            map.set(k.clone(), v);
        }
    }
    map
}

/// Decodes a digitized-plate header: gnomonic projection plus the AMD
/// plate polynomial, with the scan-offset pixel scaling.
fn decode_plate(header: &impl KeywordProvider) -> WcsResult<Wcs> {
    debug!("decoding plate-solution header");
    let ra_h = header.require_float("PLTRAH")?;
    let ra_m = header.get_float("PLTRAM").unwrap_or(0.0);
    let ra_s = header.get_float("PLTRAS").unwrap_or(0.0);
    let lon = (ra_h + ra_m / 60.0 + ra_s / 3600.0) * HOUR_TO_DEG * DEG_TO_RAD;

    let negative = header
        .get_string("PLTDECSN")
        .map(|s| s.trim().starts_with('-'))
        .unwrap_or(false);
    let dec_d = header.require_float("PLTDECD")?;
    let dec_m = header.get_float("PLTDECM").unwrap_or(0.0);
    let dec_s = header.get_float("PLTDECS").unwrap_or(0.0);
    let mut lat = (dec_d + dec_m / 60.0 + dec_s / 3600.0) * DEG_TO_RAD;
    if negative {
        lat = -lat;
    }

    let mut amd_x = [0.0; 13];
    let mut amd_y = [0.0; 13];
    for i in 0..13 {
        amd_x[i] = header.get_float(&format!("AMDX{}", i + 1)).unwrap_or(0.0);
        amd_y[i] = header.get_float(&format!("AMDY{}", i + 1)).unwrap_or(0.0);
    }

    // Pixel sizes are microns, plate offsets microns from the plate
    // origin; plate coordinates to the distorter are mm.
    let xsz = header.require_float("XPIXELSZ")?;
    let ysz = header.require_float("YPIXELSZ")?;
    if xsz == 0.0 || ysz == 0.0 {
        return Err(WcsError::invalid_keyword("XPIXELSZ", "zero pixel size"));
    }
    let ppo3 = header.require_float("PPO3")?;
    let ppo6 = header.require_float("PPO6")?;
    let cnpix1 = header.get_float("CNPIX1").unwrap_or(0.0);
    let cnpix2 = header.get_float("CNPIX2").unwrap_or(0.0);
    let scaler = Scaler::new(
        ppo3 / xsz - cnpix1 + 0.5,
        ppo6 / ysz - cnpix2 + 0.5,
        -1000.0 / xsz,
        0.0,
        0.0,
        1000.0 / ysz,
    );

    let system = equinox_system(header);
    let projection = Projection::bind(Projecter::Tan, lon, lat, None)?;
    let distorter = Distorter::Plate(PlateDistorter::new(amd_x, amd_y));

    let mut names: Vec<String> = [
        "ORIGIN", "EQUINOX", "EPOCH", "PLTSCALE", "PLTRAH", "PLTRAM", "PLTRAS", "PLTDECSN",
        "PLTDECD", "PLTDECM", "PLTDECS", "XPIXELSZ", "YPIXELSZ", "CNPIX1", "CNPIX2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for i in 1..=6 {
        names.push(format!("PPO{i}"));
    }
    for i in 1..=20 {
        names.push(format!("AMDX{i}"));
        names.push(format!("AMDY{i}"));
    }
    let captured = capture(header, &names);
    Wcs::assemble(system, projection, scaler, Some(distorter), captured)
}

/// Decodes the fixed-pattern scanned-image convention: a gnomonic
/// header flagged by the `RA---XTN` sentinel with a quadratic plane
/// correction.
fn decode_scanned(header: &impl KeywordProvider) -> WcsResult<Wcs> {
    debug!("decoding fixed-pattern scanned header");
    let lon = header.require_float("CRVAL1")? * DEG_TO_RAD;
    let lat = header.require_float("CRVAL2")? * DEG_TO_RAD;
    let c1 = header.require_float("CRPIX1")? - 0.5;
    let c2 = header.require_float("CRPIX2")? - 0.5;
    let d1 = header.require_float("CDELT1")? * DEG_TO_RAD;
    let d2 = header.require_float("CDELT2")? * DEG_TO_RAD;

    let coeff = |k: &str| header.get_float(k).unwrap_or(0.0);
    let distorter = Distorter::Scan(ScanDistorter::new(
        [coeff("XPC1"), coeff("XPC2"), coeff("XPC3")],
        [coeff("YPC1"), coeff("YPC2"), coeff("YPC3")],
    ));

    let pixel_to_plane = Scaler::new(-d1 * c1, -d2 * c2, d1, 0.0, 0.0, d2);
    let scaler = pixel_to_plane.inverse()?;
    let system = equinox_system(header);
    let projection = Projection::bind(Projecter::Tan, lon, lat, None)?;

    let names: Vec<String> = [
        "CTYPE1", "CTYPE2", "CRVAL1", "CRVAL2", "CRPIX1", "CRPIX2", "CDELT1", "CDELT2",
        "EQUINOX", "EPOCH", "XPC1", "XPC2", "XPC3", "YPC1", "YPC2", "YPC3",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let captured = capture(header, &names);
    Wcs::assemble(system, projection, scaler, Some(distorter), captured)
}

/// Standard FITS WCS decoding.
fn decode_standard(header: &impl KeywordProvider) -> WcsResult<Wcs> {
    let ctype1 = header.require_string("CTYPE1")?;
    let ctype2 = header.require_string("CTYPE2")?;
    let p1 = ctype1
        .get(..4)
        .ok_or_else(|| WcsError::invalid_keyword("CTYPE1", "shorter than an axis prefix"))?;
    let p2 = ctype2
        .get(..4)
        .ok_or_else(|| WcsError::invalid_keyword("CTYPE2", "shorter than an axis prefix"))?;

    let lat_first = if let Some(i) = LON_PREFIXES.iter().position(|&p| p == p1) {
        if p2 != LAT_PREFIXES[i] {
            return Err(WcsError::invalid_keyword(
                "CTYPE2",
                format!("latitude axis {p2:?} does not pair with {p1:?}"),
            ));
        }
        false
    } else if let Some(i) = LAT_PREFIXES.iter().position(|&p| p == p1) {
        if p2 != LON_PREFIXES[i] {
            return Err(WcsError::invalid_keyword(
                "CTYPE2",
                format!("longitude axis {p2:?} does not pair with {p1:?}"),
            ));
        }
        true
    } else {
        return Err(WcsError::invalid_keyword(
            "CTYPE1",
            format!("unknown axis prefix {p1:?}"),
        ));
    };

    let ctype_lon = if lat_first { &ctype2 } else { &ctype1 };
    let lon_prefix = if lat_first { p2 } else { p1 };

    let (crval1, crval2) = (
        header.require_float("CRVAL1")? * DEG_TO_RAD,
        header.require_float("CRVAL2")? * DEG_TO_RAD,
    );
    let (lon, lat) = if lat_first {
        (crval2, crval1)
    } else {
        (crval1, crval2)
    };

    let code = ctype_lon
        .get(5..)
        .unwrap_or("")
        .trim()
        .trim_matches('-')
        .to_owned();
    let projecter = if code.eq_ignore_ascii_case("ncp") {
        // Legacy NCP is exactly slant orthographic with the slant set
        // by the reference declination.
        debug!("mapping NCP header onto slant orthographic");
        let s = libm::sin(lat);
        if s == 0.0 {
            return Err(WcsError::invalid_keyword(
                "CRVAL2",
                "NCP projection is degenerate at declination zero",
            ));
        }
        Projecter::Sin {
            xi: 0.0,
            eta: libm::cos(lat) / s,
        }
    } else {
        Projecter::from_name(&code)?
    };

    let lonpole = header.get_float("LONPOLE").map(|d| d * DEG_TO_RAD);
    let projection = Projection::bind(projecter, lon, lat, lonpole)?;
    let system = frame_system(header, lon_prefix)?;

    // Pixel matrix in header axis order, then reordered so row 0 is
    // the longitude-like plane axis.
    let hm = header_matrix(header)?;
    let (row_x, row_y) = if lat_first { (hm[1], hm[0]) } else { (hm[0], hm[1]) };
    let (m00, m01, m10, m11) = (
        row_x[0] * DEG_TO_RAD,
        row_x[1] * DEG_TO_RAD,
        row_y[0] * DEG_TO_RAD,
        row_y[1] * DEG_TO_RAD,
    );
    let c1 = header.require_float("CRPIX1")? - 0.5;
    let c2 = header.require_float("CRPIX2")? - 0.5;
    let pixel_to_plane = Scaler::new(
        -(m00 * c1 + m01 * c2),
        -(m10 * c1 + m11 * c2),
        m00,
        m01,
        m10,
        m11,
    );
    let scaler = pixel_to_plane.inverse()?;

    let names: Vec<String> = [
        "NAXIS1", "NAXIS2", "CTYPE1", "CTYPE2", "CRVAL1", "CRVAL2", "CRPIX1", "CRPIX2",
        "CDELT1", "CDELT2", "CROTA2", "CD1_1", "CD1_2", "CD2_1", "CD2_2", "PC1_1", "PC1_2",
        "PC2_1", "PC2_2", "EQUINOX", "EPOCH", "RADESYS", "LONPOLE",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let captured = capture(header, &names);
    Wcs::assemble(system, projection, scaler, None, captured)
}

/// Equatorial-only epoch fallback used by the legacy conventions.
fn equinox_system(header: &impl KeywordProvider) -> CoordinateSystem {
    match header
        .get_float("EQUINOX")
        .or_else(|| header.get_float("EPOCH"))
    {
        Some(e) if e < 1984.0 => CoordinateSystem::besselian(e),
        Some(e) => CoordinateSystem::julian(e),
        None => CoordinateSystem::julian(2000.0),
    }
}

fn frame_system(header: &impl KeywordProvider, lon_prefix: &str) -> WcsResult<CoordinateSystem> {
    let equinox = header
        .get_float("EQUINOX")
        .or_else(|| header.get_float("EPOCH"));
    match lon_prefix {
        "RA--" => {
            if let Some(r) = header.get_string("RADESYS") {
                let r = r.trim().to_ascii_uppercase();
                if r.starts_with("ICRS") {
                    Ok(CoordinateSystem::icrs())
                } else if r.starts_with("FK4") {
                    Ok(CoordinateSystem::besselian(equinox.unwrap_or(1950.0)))
                } else if r.starts_with("FK5") {
                    Ok(CoordinateSystem::julian(equinox.unwrap_or(2000.0)))
                } else {
                    Err(WcsError::invalid_keyword(
                        "RADESYS",
                        format!("unknown reference system {r:?}"),
                    ))
                }
            } else {
                Ok(equinox_system(header))
            }
        }
        "GLON" => Ok(CoordinateSystem::galactic()),
        "ELON" => Ok(CoordinateSystem::ecliptic(equinox.unwrap_or(2000.0))),
        "HLON" => Ok(CoordinateSystem::helioecliptic(equinox.unwrap_or(2000.0))),
        other => Err(WcsError::invalid_keyword(
            "CTYPE1",
            format!("unknown axis prefix {other:?}"),
        )),
    }
}

/// The pixel-to-world matrix in header axis order and degrees, from
/// whichever scaling convention the header carries. CDELT (with the
/// optional rotation or PC matrix) takes priority over CD.
fn header_matrix(header: &impl KeywordProvider) -> WcsResult<[[f64; 2]; 2]> {
    let cdelt = (header.get_float("CDELT1"), header.get_float("CDELT2"));
    if let (Some(d1), Some(d2)) = cdelt {
        let has_pc = ["PC1_1", "PC1_2", "PC2_1", "PC2_2"]
            .iter()
            .any(|k| header.contains(k));
        if has_pc {
            let pc = |k: &str, d: f64| header.get_float(k).unwrap_or(d);
            Ok([
                [d1 * pc("PC1_1", 1.0), d1 * pc("PC1_2", 0.0)],
                [d2 * pc("PC2_1", 0.0), d2 * pc("PC2_2", 1.0)],
            ])
        } else {
            let rho = header.get_float("CROTA2").unwrap_or(0.0) * DEG_TO_RAD;
            let (s, c) = libm::sincos(rho);
            Ok([[d1 * c, -d2 * s], [d1 * s, d2 * c]])
        }
    } else if header.contains("CD1_1") {
        Ok([
            [
                header.require_float("CD1_1")?,
                header.get_float("CD1_2").unwrap_or(0.0),
            ],
            [
                header.get_float("CD2_1").unwrap_or(0.0),
                header.require_float("CD2_2")?,
            ],
        ])
    } else {
        Err(WcsError::missing_keyword("CDELT1"))
    }
}
