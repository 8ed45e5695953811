//! Kepler's equation `M = E − e·sin E` and the anomaly conversions around it.

use std::f64::consts::{PI, TAU};

use crate::error::SkyError;

/// Iteration scheme used to invert Kepler's equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeplerMethod {
    /// `E ← M + e·sin E`, started from `E = M`. Linear convergence with
    /// ratio `e·|cos E|`, so highly eccentric orbits need many steps.
    #[default]
    FixedPoint,
    /// Newton–Raphson on `f(E) = E − e·sin E − M` with Danby's starter.
    Newton,
}

/// Parameters controlling the Kepler solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolverConfig {
    pub method: KeplerMethod,
    /// Step size at which the iteration is considered converged, scaled by
    /// `1 + |M|` so unreduced mean anomalies stay above rounding noise.
    pub tolerance: f64,
    /// Hard cap on iterations. Exceeding it is a `ConvergenceError`.
    pub max_iterations: u32,
}

impl Default for KeplerSolverConfig {
    fn default() -> Self {
        Self {
            method: KeplerMethod::FixedPoint,
            tolerance: 1e-12,
            max_iterations: 1000,
        }
    }
}

/// Converged eccentric anomaly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly (rad), on the same revolution as the mean anomaly.
    pub eccentric_anomaly: f64,
    pub iterations: u32,
    /// `|E − e·sin E − M|` at the returned `E`.
    pub residual: f64,
}

/// Solve Kepler's equation for the eccentric anomaly.
///
/// `mean_anomaly` may be any real number; it is not reduced modulo 2π by the
/// fixed-point scheme. A circular orbit (`e == 0`) returns `E = M` exactly,
/// without iterating.
pub fn solve_kepler(
    mean_anomaly: f64,
    eccentricity: f64,
    config: &KeplerSolverConfig,
) -> Result<KeplerSolution, SkyError> {
    if eccentricity == 0.0 {
        return Ok(KeplerSolution {
            eccentric_anomaly: mean_anomaly,
            iterations: 0,
            residual: 0.0,
        });
    }

    let tol = config.tolerance * (1.0 + mean_anomaly.abs());
    let result = match config.method {
        KeplerMethod::FixedPoint => fixed_point(mean_anomaly, eccentricity, tol, config.max_iterations),
        KeplerMethod::Newton => newton(mean_anomaly, eccentricity, tol, config.max_iterations),
    };

    match result {
        Ok((ecc_anom, iterations)) => Ok(KeplerSolution {
            eccentric_anomaly: ecc_anom,
            iterations,
            residual: kepler_residual(ecc_anom, mean_anomaly, eccentricity),
        }),
        Err(last) => Err(SkyError::ConvergenceError {
            id: String::new(),
            mean_anomaly,
            eccentricity,
            iterations: config.max_iterations,
            residual: kepler_residual(last, mean_anomaly, eccentricity),
        }),
    }
}

fn kepler_residual(ecc_anom: f64, mean_anomaly: f64, e: f64) -> f64 {
    (ecc_anom - e * ecc_anom.sin() - mean_anomaly).abs()
}

/// `Ok((E, iterations))` on convergence, `Err(last E)` when the cap is hit.
fn fixed_point(m: f64, e: f64, tol: f64, max_iterations: u32) -> Result<(f64, u32), f64> {
    let mut ea = m;
    for iter in 1..=max_iterations {
        let next = m + e * ea.sin();
        let step = (next - ea).abs();
        ea = next;
        if step <= tol {
            return Ok((ea, iter));
        }
    }
    Err(ea)
}

fn newton(m: f64, e: f64, tol: f64, max_iterations: u32) -> Result<(f64, u32), f64> {
    // Work on the revolution containing M, then shift back.
    let revolutions = ((m + PI) / TAU).floor();
    let offset = revolutions * TAU;
    let m_red = m - offset;

    let mut ea = m_red + 0.85 * e * m_red.sin().signum();
    for iter in 1..=max_iterations {
        let f = ea - e * ea.sin() - m_red;
        let fp = 1.0 - e * ea.cos();
        let delta = f / fp;
        ea -= delta;
        if delta.abs() <= tol {
            return Ok((ea + offset, iter));
        }
    }
    Err(ea + offset)
}

/// True anomaly from eccentric anomaly, in `(−π, π]` per revolution.
///
/// `ν = 2·atan2(√(1+e)·sin(E/2), √(1−e)·cos(E/2))`
pub fn true_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let half = eccentric_anomaly / 2.0;
    2.0 * ((1.0 + eccentricity).sqrt() * half.sin()).atan2((1.0 - eccentricity).sqrt() * half.cos())
}
