//! Keplerian propagation of a planet around its host star.
//!
//! The planet is assumed to pass periapsis at the epoch of its elements
//! (mean anomaly zero at `epoch`), so the mean anomaly at a later time is
//! simply `n·Δt`. Positions are relative to the host star, in meters, in the
//! equatorial frame used for star positions.

pub mod kepler;

use std::f64::consts::TAU;

use hifitime::Epoch;
use nalgebra::Rotation3;
use tracing::{debug, warn};

use crate::error::SkyError;
use crate::units::{AU_M, GM_SUN, SECONDS_PER_DAY};
use crate::Vector3;

pub use kepler::{solve_kepler, true_anomaly, KeplerMethod, KeplerSolution, KeplerSolverConfig};

/// Unreduced mean anomalies beyond this many radians lose sub-microradian
/// precision in `f64`; such planets are flagged in the log.
const LARGE_MEAN_ANOMALY_RAD: f64 = 1e9;

/// How the orbital plane is oriented in space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationMode {
    /// Tilt by inclination only; ascending node and argument of periapsis are
    /// taken as zero whatever the record says.
    #[default]
    InclinationOnly,
    /// Full perifocal → reference rotation `Rz(Ω)·Rx(i)·Rz(ω)`. Missing Ω or ω
    /// count as zero.
    FullOrientation,
}

/// Where the mean motion comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeanMotionSource {
    /// `n = √(G·M / a³)` from host mass and semi-major axis.
    #[default]
    HostMass,
    /// `n = 2π / P` from the catalogued period.
    ObservedPeriod,
}

/// Parameters for orbit propagation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PropagationConfig {
    pub mode: PropagationMode,
    pub mean_motion: MeanMotionSource,
    pub solver: KeplerSolverConfig,
    /// Reduce the mean anomaly modulo 2π before solving. Off by default.
    pub wrap_mean_anomaly: bool,
}

/// Orbital elements as catalogued, before validation.
///
/// Every numeric field is optional because catalogues leave gaps; use
/// [`OrbitalElementsRecord::validate`] to obtain a usable [`KeplerOrbit`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElementsRecord {
    pub planet_id: String,
    /// Catalogue id of the host star (HIP number).
    pub host_id: u64,
    pub semi_major_axis_au: Option<f64>,
    pub period_days: Option<f64>,
    pub eccentricity: Option<f64>,
    pub inclination_deg: Option<f64>,
    pub host_mass_solar: Option<f64>,
    /// Last update of the elements; periapsis passage is assumed here.
    pub epoch: Epoch,
    pub ascending_node_deg: Option<f64>,
    pub argument_periapsis_deg: Option<f64>,
    /// Planet radius in Earth radii.
    pub radius_earth: Option<f64>,
}

/// Validated two-body orbit in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerOrbit {
    /// Semi-major axis (m)
    pub a: f64,
    pub e: f64,
    /// Inclination (rad)
    pub i: f64,
    /// Longitude of ascending node (rad)
    pub raan: f64,
    /// Argument of periapsis (rad)
    pub aop: f64,
    /// Mean motion (rad/s)
    pub n: f64,
    pub epoch: Epoch,
}

/// Planet state relative to its host star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Position relative to the host star (m)
    pub position: Vector3,
    pub mean_anomaly: f64,
    pub eccentric_anomaly: f64,
    pub true_anomaly: f64,
    /// Inclination (rad)
    pub inclination: f64,
    pub iterations: u32,
}

fn required(id: &str, value: Option<f64>, field: &'static str) -> Result<f64, SkyError> {
    match value {
        Some(v) if !v.is_nan() => Ok(v),
        _ => Err(SkyError::MissingOrbitalData {
            id: id.to_string(),
            field,
        }),
    }
}

impl OrbitalElementsRecord {
    /// Check the elements needed by `source` and convert them to SI units.
    ///
    /// A missing or NaN required element is `MissingOrbitalData`; a present
    /// but unphysical one (`a ≤ 0`, `e ∉ [0, 1)`, `M ≤ 0`, `P ≤ 0`) is
    /// `DataInvalid`. No defaults are substituted for required elements.
    pub fn validate(&self, source: MeanMotionSource) -> Result<KeplerOrbit, SkyError> {
        let id = self.planet_id.as_str();
        let invalid = |reason: String| SkyError::DataInvalid {
            id: id.to_string(),
            reason,
        };

        let a_au = required(id, self.semi_major_axis_au, "semi_major_axis_au")?;
        let e = required(id, self.eccentricity, "eccentricity")?;
        let i_deg = required(id, self.inclination_deg, "inclination_deg")?;

        if !(a_au.is_finite() && a_au > 0.0) {
            return Err(invalid(format!("semi-major axis {a_au} AU")));
        }
        if !(0.0..1.0).contains(&e) {
            return Err(invalid(format!("eccentricity {e} outside [0, 1)")));
        }
        if !i_deg.is_finite() {
            return Err(invalid(format!("inclination {i_deg}")));
        }
        let a = a_au * AU_M;

        let n = match source {
            MeanMotionSource::HostMass => {
                let mass = required(id, self.host_mass_solar, "host_mass_solar")?;
                if !(mass.is_finite() && mass > 0.0) {
                    return Err(invalid(format!("host mass {mass} solar masses")));
                }
                (GM_SUN * mass / a.powi(3)).sqrt()
            }
            MeanMotionSource::ObservedPeriod => {
                let period = required(id, self.period_days, "period_days")?;
                if !(period.is_finite() && period > 0.0) {
                    return Err(invalid(format!("period {period} days")));
                }
                TAU / (period * SECONDS_PER_DAY)
            }
        };

        Ok(KeplerOrbit {
            a,
            e,
            i: i_deg.to_radians(),
            raan: self
                .ascending_node_deg
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
                .to_radians(),
            aop: self
                .argument_periapsis_deg
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
                .to_radians(),
            n,
            epoch: self.epoch,
        })
    }
}

impl KeplerOrbit {
    /// State `dt_seconds` after the elements' epoch (negative = before).
    pub fn state_after(&self, dt_seconds: f64, config: &PropagationConfig) -> Result<OrbitState, SkyError> {
        let mut mean_anomaly = self.n * dt_seconds;
        if config.wrap_mean_anomaly {
            mean_anomaly = mean_anomaly.rem_euclid(TAU);
        } else if mean_anomaly.abs() > LARGE_MEAN_ANOMALY_RAD {
            warn!(
                "Mean anomaly {:.3e} rad is unreduced; angle precision is degraded",
                mean_anomaly
            );
        }

        let solution = solve_kepler(mean_anomaly, self.e, &config.solver)?;
        let ea = solution.eccentric_anomaly;
        let nu = true_anomaly(ea, self.e);

        // Perifocal position: +x toward periapsis
        let x = self.a * (ea.cos() - self.e);
        let y = self.a * (1.0 - self.e * self.e).sqrt() * ea.sin();

        let position = match config.mode {
            PropagationMode::InclinationOnly => {
                let (sin_i, cos_i) = self.i.sin_cos();
                Vector3::new(x, y * cos_i, y * sin_i)
            }
            PropagationMode::FullOrientation => self.perifocal_to_reference() * Vector3::new(x, y, 0.0),
        };

        debug!(
            "M = {:.6} rad, E = {:.6} rad ({} iterations), nu = {:.6} rad",
            mean_anomaly, ea, solution.iterations, nu
        );

        Ok(OrbitState {
            position,
            mean_anomaly,
            eccentric_anomaly: ea,
            true_anomaly: nu,
            inclination: self.i,
            iterations: solution.iterations,
        })
    }

    /// State at an absolute epoch.
    pub fn state_at(&self, epoch: Epoch, config: &PropagationConfig) -> Result<OrbitState, SkyError> {
        self.state_after((epoch - self.epoch).to_seconds(), config)
    }

    /// `Rz(Ω)·Rx(i)·Rz(ω)`
    fn perifocal_to_reference(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), self.raan)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.i)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.aop)
    }
}

/// Validate a record and propagate it to `epoch`.
///
/// Errors carry the planet id.
pub fn propagate(
    record: &OrbitalElementsRecord,
    epoch: Epoch,
    config: &PropagationConfig,
) -> Result<OrbitState, SkyError> {
    record
        .validate(config.mean_motion)?
        .state_at(epoch, config)
        .map_err(|e| e.with_id(record.planet_id.clone()))
}
