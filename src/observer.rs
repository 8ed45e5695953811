//! Where the observer stands, and how far they can see over the horizon.

use crate::ephemeris::PlanetPose;
use crate::error::SkyError;
use crate::sky::horizon::visible_declination_threshold_deg;
use crate::units::EARTH_RADIUS_M;

/// Where the observer stands.
///
/// Selects the active planet pose for a chart and supplies the geometry of
/// the horizon cut. Latitude only labels the chart; longitude rotates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverContext {
    /// Geodetic latitude (deg)
    pub latitude_deg: f64,
    /// Geodetic longitude (deg)
    pub longitude_deg: f64,
    /// Height above the surface (m)
    pub elevation_m: f64,
    /// Planet the observer stands on
    pub planet_id: String,
    /// Body radius as a multiple of Earth's
    pub body_radius_earth: f64,
}

impl Default for ObserverContext {
    /// Kyoto, at ground level, on an Earth-sized body.
    fn default() -> Self {
        Self {
            latitude_deg: 35.011665,
            longitude_deg: 135.768326,
            elevation_m: 0.0,
            planet_id: String::new(),
            body_radius_earth: 1.0,
        }
    }
}

impl ObserverContext {
    pub fn validate(&self) -> Result<(), SkyError> {
        let invalid = |reason: String| SkyError::DataInvalid {
            id: self.planet_id.clone(),
            reason,
        };
        if !(self.latitude_deg.is_finite() && self.latitude_deg.abs() <= 90.0) {
            return Err(invalid(format!("observer latitude {}", self.latitude_deg)));
        }
        if !self.longitude_deg.is_finite() {
            return Err(invalid(format!("observer longitude {}", self.longitude_deg)));
        }
        if !(self.elevation_m.is_finite() && self.elevation_m >= 0.0) {
            return Err(invalid(format!("observer elevation {} m", self.elevation_m)));
        }
        if !(self.body_radius_earth.is_finite() && self.body_radius_earth > 0.0) {
            return Err(invalid(format!(
                "body radius {} Earth radii",
                self.body_radius_earth
            )));
        }
        Ok(())
    }

    /// Body radius (m)
    pub fn body_radius_m(&self) -> f64 {
        self.body_radius_earth * EARTH_RADIUS_M
    }

    /// Lowest apparent declination still above the visible horizon (deg).
    pub fn horizon_threshold_deg(&self) -> f64 {
        visible_declination_threshold_deg(self.body_radius_m(), self.elevation_m)
    }

    /// Same observer, moved to `planet`. The catalogued planet radius, when
    /// known, replaces the body radius.
    pub fn on_planet(&self, planet: &PlanetPose) -> Self {
        Self {
            planet_id: planet.planet_id.clone(),
            body_radius_earth: planet.radius_earth.unwrap_or(self.body_radius_earth),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_ground_level() {
        let obs = ObserverContext::default();
        assert!(obs.validate().is_ok());
        assert_eq!(obs.horizon_threshold_deg(), 0.0);
        assert_eq!(obs.body_radius_m(), EARTH_RADIUS_M);
    }

    #[test]
    fn rejects_bad_geometry() {
        let bad = [
            ObserverContext {
                elevation_m: -1.0,
                ..Default::default()
            },
            ObserverContext {
                body_radius_earth: 0.0,
                ..Default::default()
            },
            ObserverContext {
                latitude_deg: 91.0,
                ..Default::default()
            },
            ObserverContext {
                longitude_deg: f64::NAN,
                ..Default::default()
            },
        ];
        for obs in &bad {
            assert_eq!(obs.validate().unwrap_err().kind(), crate::ErrorKind::DataInvalid);
        }
    }

    #[test]
    fn on_planet_takes_catalogued_radius() {
        let planet = PlanetPose {
            planet_id: "HD 209458 b".into(),
            host_id: 108859,
            position: [0.0; 3],
            true_anomaly: 0.0,
            inclination: 0.0,
            radius_earth: Some(15.6),
        };
        let obs = ObserverContext::default().on_planet(&planet);
        assert_eq!(obs.planet_id, "HD 209458 b");
        assert_eq!(obs.body_radius_earth, 15.6);
        assert_eq!(obs.latitude_deg, 35.011665);

        let unknown = PlanetPose {
            radius_earth: None,
            ..planet
        };
        assert_eq!(ObserverContext::default().on_planet(&unknown).body_radius_earth, 1.0);
    }
}
