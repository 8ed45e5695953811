use std::collections::HashSet;

use crate::catalogs::gaia::GaiaStar;
use crate::catalogs::hipparcos::HipparcosStar;
use crate::coords::{normalize_ra_deg, radec_to_vector};
use crate::error::{BatchReport, SkyError};
use crate::orbit::OrbitalElementsRecord;
use crate::units::Length;
use crate::Vector3;

/// A catalogue star as seen from the Sun.
///
/// RA/Dec are barycentric equatorial coordinates at the observation epoch.
/// The magnitude is apparent (from the Sun), lower is brighter.
#[derive(Debug, Clone, PartialEq)]
pub struct StarRecord {
    pub id: u64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub distance: Length,
    pub magnitude: f64,
    /// Johnson B−V color index, when the catalogue has one.
    pub color_index: Option<f64>,
}

impl StarRecord {
    /// Build a record, enforcing the catalogue invariants.
    ///
    /// RA wraps into `[0, 360)`. Declinations beyond ±90° by more than a
    /// rounding error are rejected, as are non-positive distances and
    /// non-finite magnitudes.
    pub fn new(
        id: u64,
        ra_deg: f64,
        dec_deg: f64,
        distance: Length,
        magnitude: f64,
        color_index: Option<f64>,
    ) -> Result<Self, SkyError> {
        let invalid = |reason: String| SkyError::DataInvalid {
            id: id.to_string(),
            reason,
        };
        if !ra_deg.is_finite() {
            return Err(invalid(format!("RA {ra_deg} is not finite")));
        }
        if !dec_deg.is_finite() || dec_deg.abs() > 90.0 + 1e-9 {
            return Err(invalid(format!("Dec {dec_deg} outside [-90, 90]")));
        }
        if !distance.is_positive() {
            return Err(invalid(format!(
                "distance {} m is not positive",
                distance.meters()
            )));
        }
        if !magnitude.is_finite() {
            return Err(invalid(format!("magnitude {magnitude} is not finite")));
        }
        Ok(Self {
            id,
            ra_deg: normalize_ra_deg(ra_deg),
            dec_deg: dec_deg.clamp(-90.0, 90.0),
            distance,
            magnitude,
            color_index: color_index.filter(|c| c.is_finite()),
        })
    }

    /// Heliocentric position in meters.
    pub fn position(&self) -> Vector3 {
        radec_to_vector(self.ra_deg, self.dec_deg, self.distance.meters())
    }
}

/// Convert a Hipparcos star to a star record, optionally propagating proper motion.
///
/// `epoch_year`: Target year for proper motion propagation (e.g. 2025.0).
/// If None, the catalog position at the Hipparcos reference epoch (J1991.25) is used.
///
/// Proper motion near the celestial poles (|dec| > ~87°) is ignored because
/// the cos(dec) divisor becomes numerically unstable.
pub fn star_from_hipparcos(
    star: &HipparcosStar,
    epoch_year: Option<f64>,
) -> Result<StarRecord, SkyError> {
    // Hipparcos reference epoch is J1991.25
    const HIPPARCOS_EPOCH_YEAR: f64 = 1991.25;
    // Convert milliarcseconds/year to radians/year
    const MAS_PER_YR_TO_RAD_PER_YR: f64 = 2.0 * std::f64::consts::PI / (3600.0 * 1000.0 * 360.0);

    let (ra, dec) = if let Some(target_year) = epoch_year {
        let dt_years = target_year - HIPPARCOS_EPOCH_YEAR;
        let cos_dec = star.dec_rad.cos();

        let (mu_ra, mu_dec) = if cos_dec.abs() > 0.05 {
            // pm_ra from Hipparcos is mu_alpha*cos(delta), so divide by cos(dec)
            (
                star.pm_ra * MAS_PER_YR_TO_RAD_PER_YR / cos_dec,
                star.pm_dec * MAS_PER_YR_TO_RAD_PER_YR,
            )
        } else {
            (0.0, 0.0)
        };

        (star.ra_rad + mu_ra * dt_years, star.dec_rad + mu_dec * dt_years)
    } else {
        (star.ra_rad, star.dec_rad)
    };

    let id = star.hip as u64;
    StarRecord::new(
        id,
        ra.to_degrees(),
        dec.to_degrees(),
        Length::from_parallax_mas(id, star.plx)?,
        star.hp_to_v() as f64,
        Some(star.b_v as f64),
    )
}

/// Convert a Gaia source to a star record.
///
/// Gaia has no Johnson B−V, so the color index is left empty; the G-band
/// mean magnitude stands in for the visual magnitude.
pub fn star_from_gaia(star: &GaiaStar) -> Result<StarRecord, SkyError> {
    let parallax = star.parallax.ok_or_else(|| SkyError::DataInvalid {
        id: star.source_id.to_string(),
        reason: "no parallax".into(),
    })?;
    StarRecord::new(
        star.source_id,
        star.ra_deg,
        star.dec_deg,
        Length::from_parallax_mas(star.source_id, parallax)?,
        star.phot_g_mean_mag,
        None,
    )
}

/// Convert a whole Hipparcos catalogue, skipping stars without a distance.
pub fn stars_from_hipparcos(
    catalog: &[HipparcosStar],
    epoch_year: Option<f64>,
) -> (Vec<StarRecord>, BatchReport) {
    collect_stars(catalog.iter().map(|s| star_from_hipparcos(s, epoch_year)))
}

/// Convert a whole Gaia export, skipping sources without a parallax.
pub fn stars_from_gaia(catalog: &[GaiaStar]) -> (Vec<StarRecord>, BatchReport) {
    collect_stars(catalog.iter().map(star_from_gaia))
}

fn collect_stars(
    results: impl Iterator<Item = Result<StarRecord, SkyError>>,
) -> (Vec<StarRecord>, BatchReport) {
    let mut report = BatchReport::default();
    let mut stars = Vec::new();
    for result in results {
        match result {
            Ok(star) => {
                report.accept();
                stars.push(star);
            }
            Err(err) => report.skip(&err),
        }
    }
    (stars, report)
}

/// Faintest magnitude visible to the naked eye.
pub const NAKED_EYE_MAGNITUDE: f64 = 6.0;

/// Keep stars at or brighter than `max_magnitude`.
pub fn brighter_than(stars: &[StarRecord], max_magnitude: f64) -> Vec<StarRecord> {
    stars
        .iter()
        .filter(|s| s.magnitude <= max_magnitude)
        .cloned()
        .collect()
}

/// Keep only stars that host one of `planets`.
pub fn hosts_only(stars: &[StarRecord], planets: &[OrbitalElementsRecord]) -> Vec<StarRecord> {
    let hosts: HashSet<u64> = planets.iter().map(|p| p.host_id).collect();
    stars
        .iter()
        .filter(|s| hosts.contains(&s.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hip(plx: f64) -> HipparcosStar {
        HipparcosStar {
            hip: 11767,
            ra_rad: 37.95_f64.to_radians(),
            dec_rad: 89.26_f64.to_radians(),
            plx,
            pm_ra: 44.48,
            pm_dec: -11.85,
            hpmag: 2.1,
            b_v: 0.636,
        }
    }

    #[test]
    fn rejects_out_of_range_rows() {
        let d = Length::from_au(1.0);
        assert!(StarRecord::new(1, 10.0, 91.0, d, 1.0, None).is_err());
        assert!(StarRecord::new(1, f64::NAN, 0.0, d, 1.0, None).is_err());
        assert!(StarRecord::new(1, 10.0, 0.0, Length::from_meters(-1.0), 1.0, None).is_err());
        assert!(StarRecord::new(1, 10.0, 0.0, d, f64::INFINITY, None).is_err());
    }

    #[test]
    fn wraps_ra_and_drops_nan_color() {
        let s = StarRecord::new(1, -10.0, 45.0, Length::from_au(1.0), 1.0, Some(f64::NAN)).unwrap();
        assert_relative_eq!(s.ra_deg, 350.0);
        assert_eq!(s.color_index, None);
    }

    #[test]
    fn hipparcos_conversion_uses_parallax_distance() {
        let s = star_from_hipparcos(&hip(7.54), None).unwrap();
        assert_eq!(s.id, 11767);
        assert_relative_eq!(s.distance.parsecs(), 1000.0 / 7.54, max_relative = 1e-12);
        assert_relative_eq!(s.ra_deg, 37.95, max_relative = 1e-12);
        assert!(s.magnitude < 2.1);
        assert_relative_eq!(s.color_index.unwrap(), 0.636, epsilon = 1e-6);
    }

    #[test]
    fn hipparcos_polar_star_ignores_proper_motion() {
        let at_epoch = star_from_hipparcos(&hip(7.54), None).unwrap();
        let propagated = star_from_hipparcos(&hip(7.54), Some(2025.0)).unwrap();
        assert_eq!(at_epoch.ra_deg, propagated.ra_deg);
        assert_eq!(at_epoch.dec_deg, propagated.dec_deg);
    }

    #[test]
    fn hipparcos_zero_parallax_is_invalid() {
        let err = star_from_hipparcos(&hip(0.0), None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DataInvalid);
    }

    #[test]
    fn magnitude_filter_is_inclusive() {
        let d = Length::from_au(1.0);
        let stars = vec![
            StarRecord::new(1, 0.0, 0.0, d, 4.0, None).unwrap(),
            StarRecord::new(2, 0.0, 0.0, d, 6.0, None).unwrap(),
            StarRecord::new(3, 0.0, 0.0, d, 6.5, None).unwrap(),
        ];
        let ids: Vec<u64> = brighter_than(&stars, NAKED_EYE_MAGNITUDE)
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn hosts_filter_keeps_planet_hosts() {
        let d = Length::from_au(1.0);
        let stars: Vec<StarRecord> = (1..=4)
            .map(|id| StarRecord::new(id, 0.0, 0.0, d, 1.0, None).unwrap())
            .collect();
        let planet = |host_id| OrbitalElementsRecord {
            planet_id: format!("p{host_id}"),
            host_id,
            semi_major_axis_au: None,
            period_days: None,
            eccentricity: None,
            inclination_deg: None,
            host_mass_solar: None,
            epoch: hifitime::Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            ascending_node_deg: None,
            argument_periapsis_deg: None,
            radius_earth: None,
        };
        let kept: Vec<u64> = hosts_only(&stars, &[planet(3), planet(1), planet(3), planet(9)])
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn batch_conversion_counts_skips() {
        let (stars, report) = stars_from_hipparcos(&[hip(7.54), hip(-1.0)], None);
        assert_eq!(stars.len(), 1);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.data_invalid, 1);
    }
}
