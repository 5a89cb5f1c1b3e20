//! Plain data types shared by the estimator and its collaborators

use super::rotation::normalize_angle;
use nalgebra::{UnitQuaternion, Vector3};
use std::ops::Sub;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Planar robot pose in the odometry frame.
///
/// `heading` is in radians and accumulates without bound; it is never wrapped
/// while integrating. Use [`Pose2D::normalized_heading`] when a canonical range
/// is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Pose2D { x, y, heading }
    }

    /// Heading folded into [-pi, pi]
    pub fn normalized_heading(&self) -> f64 {
        normalize_angle(self.heading)
    }
}

/// Last known body-frame velocity (linear components already scaled).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Twist2D {
    pub linear_x: f64,
    pub linear_y: f64,
    pub angular_z: f64,
}

/// Raw velocity sample as reported by the base controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityInput {
    pub linear_x: f64,
    pub linear_y: f64,
    pub angular_z: f64,
}

impl VelocityInput {
    pub fn new(linear_x: f64, linear_y: f64, angular_z: f64) -> Self {
        VelocityInput {
            linear_x,
            linear_y,
            angular_z,
        }
    }
}

/// Absolute pose reported by an external localization source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsolutePoseInput {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl AbsolutePoseInput {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        AbsolutePoseInput {
            position,
            orientation,
        }
    }
}

/// Point in time with nanosecond resolution.
///
/// Subtracting two timestamps yields the elapsed time in seconds. The zero
/// value is the epoch the estimator starts from before any sample arrives.
/// Nanoseconds are held in an `i128`, so any `f64` second count a caller can
/// reasonably pass keeps its distance from every other stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    nanos: i128,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };

    pub fn from_nanos(nanos: i64) -> Self {
        Timestamp {
            nanos: nanos as i128,
        }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp {
            nanos: (secs * NANOS_PER_SEC as f64).round() as i128,
        }
    }

    pub fn as_nanos(&self) -> i128 {
        self.nanos
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_SEC as f64
    }

    /// Split into whole seconds and the nanosecond remainder, as ROS headers expect
    pub fn to_sec_nanosec(&self) -> (i32, u32) {
        let sec = self.nanos.div_euclid(NANOS_PER_SEC);
        let nanosec = self.nanos.rem_euclid(NANOS_PER_SEC);
        (sec as i32, nanosec as u32)
    }
}

impl Sub for Timestamp {
    type Output = f64;

    fn sub(self, earlier: Timestamp) -> f64 {
        self.nanos.saturating_sub(earlier.nanos) as f64 / NANOS_PER_SEC as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timestamp_subtraction_yields_seconds() {
        let a = Timestamp::from_secs_f64(1.25);
        let b = Timestamp::from_secs_f64(3.75);
        assert_relative_eq!(b - a, 2.5, epsilon = 1e-12);
        assert_relative_eq!(a - b, -2.5, epsilon = 1e-12);
        assert_eq!(b - Timestamp::ZERO, 3.75);
    }

    #[test]
    fn test_timestamp_nanos_and_secs_agree() {
        let stamp = Timestamp::from_secs_f64(12.5);
        assert_eq!(stamp.as_nanos(), 12_500_000_000);
        assert_eq!(stamp.as_secs_f64(), 12.5);
        assert_eq!(Timestamp::from_nanos(-250_000_000).as_secs_f64(), -0.25);
        assert_eq!(Timestamp::from_secs_f64(stamp.as_secs_f64()), stamp);
    }

    #[test]
    fn test_far_apart_stamps_keep_their_gap() {
        // Beyond the range of i64 nanoseconds
        let late = Timestamp::from_secs_f64(1e12);
        let early = Timestamp::from_secs_f64(1e10);
        assert_relative_eq!(late - early, 1e12 - 1e10, max_relative = 1e-12);

        // Difference overflows i64 nanoseconds
        let after = Timestamp::from_secs_f64(1e9);
        let before = Timestamp::from_secs_f64(-9.3e9);
        assert_relative_eq!(after - before, 1.03e10, max_relative = 1e-12);
        assert_relative_eq!(before - after, -1.03e10, max_relative = 1e-12);

        // Saturated extremes still subtract without panicking
        let gap = Timestamp::from_secs_f64(f64::MAX) - Timestamp::from_secs_f64(f64::MIN);
        assert!(gap > 0.0);
    }

    #[test]
    fn test_timestamp_sec_nanosec_split() {
        assert_eq!(Timestamp::from_nanos(1_500_000_000).to_sec_nanosec(), (1, 500_000_000));
        assert_eq!(Timestamp::ZERO.to_sec_nanosec(), (0, 0));
        assert_eq!(Timestamp::from_nanos(-1).to_sec_nanosec(), (-1, 999_999_999));
    }

    #[test]
    fn test_normalized_heading_leaves_raw_value() {
        let pose = Pose2D::new(0.0, 0.0, 3.0 * std::f64::consts::PI);
        assert_relative_eq!(pose.normalized_heading().abs(), std::f64::consts::PI, epsilon = 1e-9);
        assert_eq!(pose.heading, 3.0 * std::f64::consts::PI);
    }
}
