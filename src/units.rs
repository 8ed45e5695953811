//! Physical constants and the canonical length unit.
//!
//! Every position inside the crate is expressed in meters. Catalogue inputs
//! arrive in astronomical units, parsecs or as a parallax; they are converted
//! once, at the boundary, through [`Length`].

use crate::error::SkyError;

/// Astronomical unit (m), IAU 2012 exact definition.
pub const AU_M: f64 = 1.495_978_707e11;

/// Parsec (m).
pub const PARSEC_M: f64 = 3.085_677_581_491_367_3e16;

/// Mean Earth radius (m).
pub const EARTH_RADIUS_M: f64 = 6.371e6;

/// Nominal solar mass parameter GM☉ (m³/s²), IAU 2015 B3.
pub const GM_SUN: f64 = 1.327_124_400_18e20;

/// Seconds per day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Unit of a distance column in an input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    AstronomicalUnits,
    Parsecs,
    Meters,
}

impl DistanceUnit {
    /// Meters per one input unit.
    pub fn meters_per_unit(self) -> f64 {
        match self {
            DistanceUnit::AstronomicalUnits => AU_M,
            DistanceUnit::Parsecs => PARSEC_M,
            DistanceUnit::Meters => 1.0,
        }
    }
}

/// A length, stored in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Length(f64);

impl Length {
    pub const fn from_meters(m: f64) -> Self {
        Self(m)
    }

    pub fn from_au(au: f64) -> Self {
        Self(au * AU_M)
    }

    pub fn from_parsecs(pc: f64) -> Self {
        Self(pc * PARSEC_M)
    }

    pub fn from_unit(value: f64, unit: DistanceUnit) -> Self {
        Self(value * unit.meters_per_unit())
    }

    /// Distance from a trigonometric parallax in milliarcseconds.
    ///
    /// `d[pc] = 1000 / parallax[mas]`. Zero, negative and non-finite
    /// parallaxes have no distance and are rejected.
    pub fn from_parallax_mas(id: u64, parallax_mas: f64) -> Result<Self, SkyError> {
        if !parallax_mas.is_finite() || parallax_mas <= 0.0 {
            return Err(SkyError::DataInvalid {
                id: id.to_string(),
                reason: format!("non-positive parallax {parallax_mas} mas"),
            });
        }
        Ok(Self::from_parsecs(1000.0 / parallax_mas))
    }

    pub fn meters(self) -> f64 {
        self.0
    }

    pub fn au(self) -> f64 {
        self.0 / AU_M
    }

    pub fn parsecs(self) -> f64 {
        self.0 / PARSEC_M
    }

    /// `true` for a strictly positive, finite length.
    pub fn is_positive(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parallax_of_one_arcsec_is_one_parsec() {
        let d = Length::from_parallax_mas(1, 1000.0).unwrap();
        assert_relative_eq!(d.parsecs(), 1.0, max_relative = 1e-15);
        assert_relative_eq!(d.au(), 206_264.806, max_relative = 1e-8);
    }

    #[test]
    fn non_positive_parallax_is_rejected() {
        assert!(Length::from_parallax_mas(7, 0.0).is_err());
        assert!(Length::from_parallax_mas(7, -2.5).is_err());
        assert!(Length::from_parallax_mas(7, f64::NAN).is_err());
    }

    #[test]
    fn unit_conversion_is_explicit() {
        let d = Length::from_unit(2.0, DistanceUnit::AstronomicalUnits);
        assert_eq!(d.meters(), 2.0 * AU_M);
        assert_eq!(Length::from_unit(3.0, DistanceUnit::Meters).meters(), 3.0);
        assert!(!Length::from_meters(0.0).is_positive());
    }
}
