//! Equatorial ↔ Cartesian conversion.
//!
//! Axes follow the usual equatorial convention: +X toward RA = 0°, Dec = 0°,
//! +Z toward the north celestial pole, +Y completing a right-handed frame.
//! The length unit of the Cartesian side is whatever unit the distance was
//! given in; inside the crate that is always meters (see [`crate::units`]).

use crate::error::SkyError;
use crate::Vector3;

/// Wrap a right ascension in degrees to `[0, 360)`.
pub fn normalize_ra_deg(ra_deg: f64) -> f64 {
    let ra = ra_deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if ra >= 360.0 {
        0.0
    } else {
        ra
    }
}

/// Convert RA/Dec (degrees) and a distance to Cartesian `(x, y, z)`.
pub fn to_cartesian(ra_deg: f64, dec_deg: f64, distance: f64) -> (f64, f64, f64) {
    let (sin_ra, cos_ra) = ra_deg.to_radians().sin_cos();
    let (sin_dec, cos_dec) = dec_deg.to_radians().sin_cos();
    (
        distance * cos_dec * cos_ra,
        distance * cos_dec * sin_ra,
        distance * sin_dec,
    )
}

/// Same as [`to_cartesian`], returning a vector.
pub fn radec_to_vector(ra_deg: f64, dec_deg: f64, distance: f64) -> Vector3 {
    let (x, y, z) = to_cartesian(ra_deg, dec_deg, distance);
    Vector3::new(x, y, z)
}

/// Recover RA/Dec (degrees) from a Cartesian direction.
///
/// RA is normalized to `[0, 360)`. The direction must have non-zero, finite
/// length; otherwise declination is undefined and a `DomainError` is returned.
pub fn to_equatorial(x: f64, y: f64, z: f64) -> Result<(f64, f64), SkyError> {
    let norm = x.hypot(y).hypot(z);
    if !norm.is_finite() || norm == 0.0 {
        return Err(SkyError::DomainError {
            id: String::new(),
            reason: format!("cannot take RA/Dec of vector ({x}, {y}, {z})"),
        });
    }
    let ra = normalize_ra_deg(y.atan2(x).to_degrees());
    // clamp absorbs |z| / norm overshooting 1 by an ulp
    let dec = (z / norm).clamp(-1.0, 1.0).asin().to_degrees();
    Ok((ra, dec))
}

/// Same as [`to_equatorial`], taking a vector.
pub fn vector_to_radec(v: &Vector3) -> Result<(f64, f64), SkyError> {
    to_equatorial(v.x, v.y, v.z)
}
