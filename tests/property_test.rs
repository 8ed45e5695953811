//! Seeded randomized checks of the geometric invariants.

use std::f64::consts::TAU;

use aliensky::orbit::{solve_kepler, KeplerMethod, KeplerSolverConfig};
use aliensky::units::AU_M;
use aliensky::{
    to_cartesian, to_equatorial, visible_declination_threshold_deg, MeanMotionSource,
    OrbitalElementsRecord, PropagationConfig, PropagationMode,
};
use approx::assert_relative_eq;
use hifitime::Epoch;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Signed difference of two angles in degrees, in (-180, 180].
fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

#[test]
fn test_equatorial_round_trip() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10_000 {
        let ra: f64 = rng.random::<f64>() * 360.0;
        // uniform on the sphere, poles excluded
        let dec: f64 = (rng.random::<f64>() * 1.999_999 - 0.999_999).asin().to_degrees();
        let dist: f64 = 10f64.powf(rng.random::<f64>() * 22.0 - 2.0);

        let (x, y, z) = to_cartesian(ra, dec, dist);
        let (ra2, dec2) = to_equatorial(x, y, z).unwrap();

        assert!((0.0..360.0).contains(&ra2));
        assert!(
            angle_diff_deg(ra2, ra).abs() <= 1e-9 * ra.max(1.0),
            "ra {ra} -> {ra2}"
        );
        assert_relative_eq!(dec2, dec, epsilon = 1e-9, max_relative = 1e-9);
        assert_relative_eq!((x * x + y * y + z * z).sqrt(), dist, max_relative = 1e-12);
    }
}

#[test]
fn test_kepler_residual_both_methods() {
    let mut rng = StdRng::seed_from_u64(7);
    let fixed = KeplerSolverConfig::default();
    let newton = KeplerSolverConfig {
        method: KeplerMethod::Newton,
        ..Default::default()
    };
    for _ in 0..5_000 {
        let e: f64 = rng.random::<f64>() * 0.95;
        let m: f64 = (rng.random::<f64>() - 0.5) * 100.0;
        let a = solve_kepler(m, e, &fixed).unwrap();
        let b = solve_kepler(m, e, &newton).unwrap();
        assert!(a.residual < 1e-9, "fixed point e={e} M={m}: {}", a.residual);
        assert!(b.residual < 1e-9, "newton e={e} M={m}: {}", b.residual);
        assert_relative_eq!(a.eccentric_anomaly, b.eccentric_anomaly, epsilon = 1e-8);
    }
}

#[test]
fn test_orbit_radius_stays_between_apsides() {
    let mut rng = StdRng::seed_from_u64(2024);
    let epoch = Epoch::from_gregorian_utc_at_midnight(2015, 6, 1);
    for i in 0..500 {
        let a_au = 0.01 + rng.random::<f64>() * 30.0;
        let e = rng.random::<f64>() * 0.9;
        let record = OrbitalElementsRecord {
            planet_id: format!("p{i}"),
            host_id: 1,
            semi_major_axis_au: Some(a_au),
            period_days: None,
            eccentricity: Some(e),
            inclination_deg: Some((rng.random::<f64>() - 0.5) * 180.0),
            host_mass_solar: Some(0.1 + rng.random::<f64>() * 3.0),
            epoch,
            ascending_node_deg: Some(rng.random::<f64>() * 360.0),
            argument_periapsis_deg: Some(rng.random::<f64>() * 360.0),
            radius_earth: None,
        };
        let orbit = record.validate(MeanMotionSource::HostMass).unwrap();
        let dt = rng.random::<f64>() * 5.0 * TAU / orbit.n;

        for mode in [PropagationMode::InclinationOnly, PropagationMode::FullOrientation] {
            let config = PropagationConfig {
                mode,
                ..Default::default()
            };
            let state = orbit.state_after(dt, &config).unwrap();
            let r = state.position.norm() / AU_M;
            assert!(r >= a_au * (1.0 - e) * (1.0 - 1e-9), "{mode:?}: r = {r}");
            assert!(r <= a_au * (1.0 + e) * (1.0 + 1e-9), "{mode:?}: r = {r}");
        }
    }
}

#[test]
fn test_horizon_threshold_monotone_for_any_body() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..1_000 {
        let radius = 1e5 + rng.random::<f64>() * 1e8;
        let h1 = rng.random::<f64>() * 1e6;
        let h2 = h1 + 1.0 + rng.random::<f64>() * 1e6;
        assert!(
            visible_declination_threshold_deg(radius, h2) < visible_declination_threshold_deg(radius, h1)
        );
    }
}
