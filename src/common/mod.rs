//! Common types and utilities used across the codebase
pub mod rotation;
pub mod types;

pub use self::rotation::{
    normalize_angle, quaternion_from_rpy, quaternion_to_rpy, yaw_to_quaternion,
};
pub use self::types::{AbsolutePoseInput, Pose2D, Timestamp, Twist2D, VelocityInput};
