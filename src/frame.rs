//! Rigid planet poses.
//!
//! A planet's pose places it in the heliocentric equatorial frame: the
//! translation is its absolute position (host star + orbit offset) and the
//! rotation is built from its true anomaly and inclination,
//! `R = R_y(i) · R_z(ν)`.

use nalgebra::Rotation3;

use crate::{Matrix4, Vector3};

/// Planet absolute position: host star position plus the planet's offset
/// from it. Both operands must share the unit and the frame.
pub fn compose(star_absolute: &Vector3, planet_relative: &Vector3) -> Vector3 {
    star_absolute + planet_relative
}

/// `R_y(inclination) · R_z(true_anomaly)`, angles in radians.
pub fn orbit_rotation(true_anomaly: f64, inclination: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), inclination)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), true_anomaly)
}

/// SE(3) pose: `p_world = R · p_body + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Pose of a planet at `position` with the given orbit angles (radians).
    pub fn from_orbit(true_anomaly: f64, inclination: f64, position: Vector3) -> Self {
        Self {
            rotation: orbit_rotation(true_anomaly, inclination),
            translation: position,
        }
    }

    /// 4×4 homogeneous matrix `[R | t; 0 0 0 1]`.
    pub fn to_matrix(&self) -> Matrix4 {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(self.rotation.matrix());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    /// Top three rows of the homogeneous matrix, row-major:
    /// `r11 r12 r13 tx r21 r22 r23 ty r31 r32 r33 tz`.
    pub fn to_row_major(&self) -> [f64; 12] {
        let r = self.rotation.matrix();
        let t = &self.translation;
        [
            r[(0, 0)], r[(0, 1)], r[(0, 2)], t.x,
            r[(1, 0)], r[(1, 1)], r[(1, 2)], t.y,
            r[(2, 0)], r[(2, 1)], r[(2, 2)], t.z,
        ]
    }

    /// Inverse of [`Pose::to_row_major`].
    ///
    /// The rotation block is taken as given; callers feeding external data
    /// should make sure it is orthonormal.
    pub fn from_row_major(v: &[f64; 12]) -> Self {
        let m = nalgebra::Matrix3::new(v[0], v[1], v[2], v[4], v[5], v[6], v[8], v[9], v[10]);
        Self {
            rotation: Rotation3::from_matrix_unchecked(m),
            translation: Vector3::new(v[3], v[7], v[11]),
        }
    }

    /// Body-frame point to world frame.
    pub fn transform_point(&self, body: &Vector3) -> Vector3 {
        self.rotation * body + self.translation
    }

    /// World-frame point to body frame: `Rᵀ · (p − t)`.
    pub fn inverse_transform_point(&self, world: &Vector3) -> Vector3 {
        self.rotation.inverse() * (world - self.translation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn compose_is_vector_sum() {
        let star = Vector3::new(1.0, 2.0, 3.0);
        let rel = Vector3::new(-0.5, 0.25, 4.0);
        assert_eq!(compose(&star, &rel), Vector3::new(0.5, 2.25, 7.0));
    }

    #[test]
    fn rotation_matches_explicit_product() {
        let (nu, inc) = (0.7_f64, 0.3_f64);
        let rz = nalgebra::Matrix3::new(
            nu.cos(), -nu.sin(), 0.0,
            nu.sin(), nu.cos(), 0.0,
            0.0, 0.0, 1.0,
        );
        let ry = nalgebra::Matrix3::new(
            inc.cos(), 0.0, inc.sin(),
            0.0, 1.0, 0.0,
            -inc.sin(), 0.0, inc.cos(),
        );
        assert_relative_eq!(*orbit_rotation(nu, inc).matrix(), ry * rz, epsilon = 1e-15);
    }

    #[test]
    fn zero_angles_give_identity_rotation() {
        let pose = Pose::from_orbit(0.0, 0.0, Vector3::new(5.0, 6.0, 7.0));
        assert_eq!(pose.rotation, Rotation3::identity());
        assert_eq!(pose.to_row_major()[3], 5.0);
    }

    #[test]
    fn matrix_layout() {
        let pose = Pose::from_orbit(FRAC_PI_2, 0.0, Vector3::new(1.0, 2.0, 3.0));
        let m: Matrix4 = pose.to_matrix();
        assert_eq!(m[(3, 3)], 1.0);
        assert_eq!(m[(3, 0)], 0.0);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(2, 3)], 3.0);
        assert_relative_eq!(m[(1, 0)], 1.0, epsilon = 1e-15);

        let flat = pose.to_row_major();
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(flat[row * 4 + col], m[(row, col)]);
            }
        }
        assert_eq!(Pose::from_row_major(&flat), pose);
    }

    #[test]
    fn inverse_undoes_forward() {
        let pose = Pose::from_orbit(1.1, -0.4, Vector3::new(1e11, -3e10, 2e9));
        let p = Vector3::new(4e12, 5e11, -6e12);
        let back = pose.inverse_transform_point(&pose.transform_point(&p));
        assert_relative_eq!(back, p, max_relative = 1e-12);
    }

    #[test]
    fn pose_is_deterministic() {
        let a = Pose::from_orbit(2.5, 0.9, Vector3::new(1.0, 2.0, 3.0));
        let b = Pose::from_orbit(2.5, 0.9, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(a.to_row_major(), b.to_row_major());
    }
}
