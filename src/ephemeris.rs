//! Planet poses for a single epoch.
//!
//! `Ephemeris::compute` is the batch form of the frame composer: every planet
//! is joined to its host star, propagated along its orbit, offset by the host
//! position and turned into a [`Pose`]. Planets that fail any step are
//! dropped and counted; the rest of the batch is unaffected.
//!
//! The result can be stored with rkyv for fast reloading, or written as a CSV
//! pose table.

use std::collections::HashMap;
use std::path::Path;

use hifitime::Epoch;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BatchReport, SkyError};
use crate::frame::{compose, Pose};
use crate::orbit::{propagate, OrbitalElementsRecord, PropagationConfig};
use crate::star::StarRecord;
use crate::Vector3;

/// Pose of one planet, flattened for storage.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct PlanetPose {
    pub planet_id: String,
    pub host_id: u64,
    /// Heliocentric position (m)
    pub position: [f64; 3],
    /// True anomaly (rad)
    pub true_anomaly: f64,
    /// Inclination (rad)
    pub inclination: f64,
    /// Planet radius in Earth radii, when catalogued.
    pub radius_earth: Option<f64>,
}

impl PlanetPose {
    pub fn position_vector(&self) -> Vector3 {
        Vector3::from(self.position)
    }

    pub fn pose(&self) -> Pose {
        Pose::from_orbit(self.true_anomaly, self.inclination, self.position_vector())
    }
}

/// All planet poses at one epoch, in input order.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Ephemeris {
    /// Epoch as TAI seconds past J1900 (hifitime's reference).
    pub epoch_tai_seconds: f64,
    pub planets: Vec<PlanetPose>,
}

impl Ephemeris {
    /// Propagate every planet to `epoch` and compose its heliocentric pose.
    pub fn compute(
        planets: &[OrbitalElementsRecord],
        stars: &[StarRecord],
        epoch: Epoch,
        config: &PropagationConfig,
    ) -> (Self, BatchReport) {
        let hosts: HashMap<u64, &StarRecord> = stars.iter().map(|s| (s.id, s)).collect();
        let mut report = BatchReport::default();
        let mut out = Vec::with_capacity(planets.len());

        for record in planets {
            match Self::compute_one(record, &hosts, epoch, config) {
                Ok(pose) => {
                    report.accept();
                    out.push(pose);
                }
                Err(err) => report.skip(&err),
            }
        }

        info!("Ephemeris at {}: {}", epoch, report);
        (
            Self {
                epoch_tai_seconds: epoch.to_tai_seconds(),
                planets: out,
            },
            report,
        )
    }

    fn compute_one(
        record: &OrbitalElementsRecord,
        hosts: &HashMap<u64, &StarRecord>,
        epoch: Epoch,
        config: &PropagationConfig,
    ) -> Result<PlanetPose, SkyError> {
        let host = hosts.get(&record.host_id).ok_or_else(|| SkyError::DataInvalid {
            id: record.planet_id.clone(),
            reason: format!("host star {} not in star table", record.host_id),
        })?;
        let state = propagate(record, epoch, config)?;
        let absolute = compose(&host.position(), &state.position);
        debug!(
            "{}: |r - host| = {:.4e} m, nu = {:.4} rad",
            record.planet_id,
            state.position.norm(),
            state.true_anomaly
        );
        Ok(PlanetPose {
            planet_id: record.planet_id.clone(),
            host_id: record.host_id,
            position: absolute.into(),
            true_anomaly: state.true_anomaly,
            inclination: state.inclination,
            radius_earth: record.radius_earth.filter(|r| r.is_finite() && *r > 0.0),
        })
    }

    pub fn epoch(&self) -> Epoch {
        Epoch::from_tai_seconds(self.epoch_tai_seconds)
    }

    pub fn len(&self) -> usize {
        self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    pub fn get(&self, planet_id: &str) -> Option<&PlanetPose> {
        self.planets.iter().find(|p| p.planet_id == planet_id)
    }

    /// Serialize the ephemeris to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Deserialize an ephemeris previously produced by [`Ephemeris::to_rkyv_bytes`].
    pub fn from_rkyv_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        // archived f64 fields must be 8-byte aligned
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))
    }

    /// Save the ephemeris to a file using rkyv.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            "Saved ephemeris to {} ({} planets, {} bytes)",
            path.as_ref().display(),
            self.planets.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Load an ephemeris from an rkyv file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let eph = Self::from_rkyv_bytes(&bytes)?;
        info!(
            "Loaded ephemeris at {}: {} planets",
            eph.epoch(),
            eph.planets.len()
        );
        Ok(eph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Length, AU_M};
    use approx::assert_relative_eq;

    fn epoch() -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2024, 3, 1)
    }

    fn host(id: u64, ra: f64) -> StarRecord {
        StarRecord::new(id, ra, 0.0, Length::from_parsecs(10.0), 4.0, Some(0.65)).unwrap()
    }

    fn planet(id: &str, host_id: u64, e: Option<f64>) -> OrbitalElementsRecord {
        OrbitalElementsRecord {
            planet_id: id.into(),
            host_id,
            semi_major_axis_au: Some(1.0),
            period_days: None,
            eccentricity: e,
            inclination_deg: Some(0.0),
            host_mass_solar: Some(1.0),
            epoch: epoch(),
            ascending_node_deg: None,
            argument_periapsis_deg: None,
            radius_earth: Some(1.3),
        }
    }

    #[test]
    fn planet_sits_one_au_from_host_at_epoch() {
        let stars = vec![host(10, 0.0)];
        let (eph, report) = Ephemeris::compute(
            &[planet("x b", 10, Some(0.0))],
            &stars,
            epoch(),
            &PropagationConfig::default(),
        );
        assert_eq!(report.accepted, 1);
        let p = eph.get("x b").unwrap();
        let offset = p.position_vector() - stars[0].position();
        assert_relative_eq!(offset.x, AU_M, max_relative = 1e-6);
        assert_relative_eq!(offset.y, 0.0, epsilon = 1.0);
        assert_eq!(p.pose().translation, p.position_vector());
        assert_eq!(p.radius_earth, Some(1.3));
    }

    #[test]
    fn bad_planets_are_skipped_and_counted() {
        let stars = vec![host(10, 0.0), host(11, 90.0)];
        let planets = vec![
            planet("ok b", 10, Some(0.1)),
            planet("orphan b", 99, Some(0.1)),
            planet("noecc b", 11, None),
            planet("ok c", 11, Some(0.2)),
        ];
        let (eph, report) =
            Ephemeris::compute(&planets, &stars, epoch(), &PropagationConfig::default());
        let ids: Vec<&str> = eph.planets.iter().map(|p| p.planet_id.as_str()).collect();
        assert_eq!(ids, vec!["ok b", "ok c"]);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.data_invalid, 1);
        assert_eq!(report.missing_orbital_data, 1);
    }

    #[test]
    fn rkyv_round_trip() {
        let stars = vec![host(10, 45.0)];
        let (eph, _) = Ephemeris::compute(
            &[planet("x b", 10, Some(0.3))],
            &stars,
            epoch() + hifitime::Duration::from_days(12.5),
            &PropagationConfig::default(),
        );
        let bytes = eph.to_rkyv_bytes().unwrap();
        let back = Ephemeris::from_rkyv_bytes(&bytes).unwrap();
        assert_eq!(back, eph);
        assert_eq!(back.epoch(), eph.epoch());
    }

    #[test]
    fn corrupt_bytes_are_an_error() {
        assert!(Ephemeris::from_rkyv_bytes(&[1, 2, 3]).is_err());
    }
}
