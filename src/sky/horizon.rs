//! Visible horizon of a spherical body without atmosphere.

/// Horizon dip (deg) for an observer `elevation_m` above a sphere of radius
/// `body_radius_m`: `90° − asin(R / (R + h))`.
pub fn horizon_dip_deg(body_radius_m: f64, elevation_m: f64) -> f64 {
    let ratio = (body_radius_m / (body_radius_m + elevation_m)).clamp(-1.0, 1.0);
    90.0 - ratio.asin().to_degrees()
}

/// Declination threshold (deg) of the horizon cut. A star is visible when its
/// apparent declination is at or above this value.
///
/// Ground level gives 0°; every metre of elevation lowers the threshold by
/// the dip, opening more sky.
pub fn visible_declination_threshold_deg(body_radius_m: f64, elevation_m: f64) -> f64 {
    -horizon_dip_deg(body_radius_m, elevation_m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::EARTH_RADIUS_M;
    use approx::assert_relative_eq;

    #[test]
    fn ground_level_has_no_dip() {
        assert_eq!(horizon_dip_deg(EARTH_RADIUS_M, 0.0), 0.0);
        assert_eq!(visible_declination_threshold_deg(EARTH_RADIUS_M, 0.0), 0.0);
    }

    #[test]
    fn threshold_strictly_decreases_with_elevation() {
        let elevations = [0.0, 1.0, 10.0, 1_000.0, 8_848.0, 1e5, 1e7];
        let thresholds: Vec<f64> = elevations
            .iter()
            .map(|&h| visible_declination_threshold_deg(EARTH_RADIUS_M, h))
            .collect();
        for pair in thresholds.windows(2) {
            assert!(pair[1] < pair[0], "{:?}", thresholds);
        }
        assert!(thresholds.iter().all(|t| *t > -90.0));
    }

    #[test]
    fn known_dip_at_mount_everest() {
        // ≈ 3.02° at 8848 m on Earth
        assert_relative_eq!(horizon_dip_deg(EARTH_RADIUS_M, 8_848.0), 3.02, epsilon = 0.01);
    }

    #[test]
    fn larger_body_dips_less_at_same_height() {
        let small = horizon_dip_deg(EARTH_RADIUS_M, 100.0);
        let large = horizon_dip_deg(10.0 * EARTH_RADIUS_M, 100.0);
        assert!(large < small);
    }
}
