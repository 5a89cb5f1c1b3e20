//! Odometry sample assembly

use crate::common::{Timestamp, Twist2D};
use crate::config::{BASE_FRAME_ID, ODOM_FRAME_ID};
use nalgebra::{UnitQuaternion, Vector3};

/// Row-major 6x6 covariance over (x, y, z, roll, pitch, yaw)
pub type Covariance = [f64; 36];

pub const POSE_VARIANCE: f64 = 0.001;
pub const TWIST_VARIANCE: f64 = 0.0001;

/// Indices of the x, y and yaw diagonal entries in a row-major 6x6 matrix
pub const PLANAR_DIAGONAL: [usize; 3] = [0, 7, 35];

/// Covariance with only the planar diagonal entries set
pub fn planar_covariance(variance: f64) -> Covariance {
    let mut covariance = [0.0; 36];
    for index in PLANAR_DIAGONAL {
        covariance[index] = variance;
    }
    covariance
}

/// Timestamped pose and velocity estimate handed to downstream consumers
#[derive(Debug, Clone, PartialEq)]
pub struct OdometrySample {
    pub stamp: Timestamp,
    pub frame_id: String,
    pub child_frame_id: String,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub pose_covariance: Covariance,
    pub twist: Twist2D,
    pub twist_covariance: Covariance,
}

impl OdometrySample {
    /// Transform record carrying the same position and orientation
    pub fn to_transform(&self) -> TransformSample {
        TransformSample {
            stamp: self.stamp,
            frame_id: self.frame_id.clone(),
            child_frame_id: self.child_frame_id.clone(),
            translation: self.position,
            rotation: self.orientation,
        }
    }
}

/// Odometry-to-base transform for frame broadcasting
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSample {
    pub stamp: Timestamp,
    pub frame_id: String,
    pub child_frame_id: String,
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

/// Assemble an odometry sample in the `odom` -> `base_footprint` frames.
///
/// The position is planar, so `z` is always zero.
pub fn build_sample(
    stamp: Timestamp,
    x: f64,
    y: f64,
    orientation: UnitQuaternion<f64>,
    twist: Twist2D,
) -> OdometrySample {
    OdometrySample {
        stamp,
        frame_id: ODOM_FRAME_ID.to_string(),
        child_frame_id: BASE_FRAME_ID.to_string(),
        position: Vector3::new(x, y, 0.0),
        orientation,
        pose_covariance: planar_covariance(POSE_VARIANCE),
        twist,
        twist_covariance: planar_covariance(TWIST_VARIANCE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_covariance_layout() {
        let covariance = planar_covariance(0.5);
        for (index, value) in covariance.iter().enumerate() {
            if PLANAR_DIAGONAL.contains(&index) {
                assert_eq!(*value, 0.5);
            } else {
                assert_eq!(*value, 0.0, "unexpected entry at {}", index);
            }
        }
    }

    #[test]
    fn test_build_sample_frames_and_covariance() {
        let twist = Twist2D {
            linear_x: 0.2,
            linear_y: 0.0,
            angular_z: -0.1,
        };
        let sample = build_sample(
            Timestamp::from_secs_f64(4.0),
            1.0,
            -2.0,
            UnitQuaternion::identity(),
            twist,
        );

        assert_eq!(sample.frame_id, "odom");
        assert_eq!(sample.child_frame_id, "base_footprint");
        assert_eq!(sample.position, Vector3::new(1.0, -2.0, 0.0));
        assert_eq!(sample.twist, twist);
        assert_eq!(sample.pose_covariance[0], 0.001);
        assert_eq!(sample.pose_covariance[7], 0.001);
        assert_eq!(sample.pose_covariance[35], 0.001);
        assert_eq!(sample.twist_covariance[0], 0.0001);
        assert_eq!(sample.twist_covariance[7], 0.0001);
        assert_eq!(sample.twist_covariance[35], 0.0001);
    }

    #[test]
    fn test_transform_mirrors_sample() {
        let sample = build_sample(
            Timestamp::from_nanos(42),
            3.0,
            4.0,
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.7),
            Twist2D::default(),
        );
        let transform = sample.to_transform();

        assert_eq!(transform.stamp, sample.stamp);
        assert_eq!(transform.frame_id, sample.frame_id);
        assert_eq!(transform.child_frame_id, sample.child_frame_id);
        assert_eq!(transform.translation, sample.position);
        assert_eq!(transform.rotation, sample.orientation);
    }
}
