//! Conversions between planar headings, Euler angles and quaternions

use nalgebra::UnitQuaternion;
use std::f64::consts::PI;

/// Rotation about the vertical axis only (zero roll and pitch).
pub fn yaw_to_quaternion(yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(0.0, 0.0, yaw)
}

/// Build an orientation from roll, pitch and yaw (radians)
pub fn quaternion_from_rpy(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(roll, pitch, yaw)
}

/// Decompose an orientation into `(roll, pitch, yaw)`
pub fn quaternion_to_rpy(orientation: &UnitQuaternion<f64>) -> (f64, f64, f64) {
    orientation.euler_angles()
}

/// Normalize angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_yaw_to_quaternion_is_planar() {
        let q = yaw_to_quaternion(FRAC_PI_2);
        assert_relative_eq!(q.i, 0.0);
        assert_relative_eq!(q.j, 0.0);
        assert_relative_eq!(q.k, (FRAC_PI_2 / 2.0).sin(), epsilon = 1e-12);
        assert_relative_eq!(q.w, (FRAC_PI_2 / 2.0).cos(), epsilon = 1e-12);
    }

    #[test]
    fn test_rpy_round_trip_through_quaternion() {
        let q = quaternion_from_rpy(0.1, -0.2, 1.3);
        let (roll, pitch, yaw) = quaternion_to_rpy(&q);
        assert_relative_eq!(roll, 0.1, epsilon = 1e-9);
        assert_relative_eq!(pitch, -0.2, epsilon = 1e-9);
        assert_relative_eq!(yaw, 1.3, epsilon = 1e-9);
    }

    #[test]
    fn test_unwrapped_yaw_keeps_rotation() {
        let wrapped = yaw_to_quaternion(0.5);
        let unwrapped = yaw_to_quaternion(0.5 + 4.0 * PI);
        assert_relative_eq!(wrapped.angle_to(&unwrapped), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(0.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(2.0 * PI + 0.25), 0.25, epsilon = 1e-9);
        assert_relative_eq!(normalize_angle(-2.0 * PI - 0.25), -0.25, epsilon = 1e-9);
        assert_relative_eq!(normalize_angle(1.5 * PI), -0.5 * PI, epsilon = 1e-9);
    }
}
