//! Configuration for the odometry estimator

use crate::{OdometryError, Result};
use std::collections::HashMap;

/// Input topic carrying raw base velocities
pub const VELOCITY_TOPIC: &str = "raw_vel";
/// Input topic carrying absolute poses from an external localizer
pub const POSE_TOPIC: &str = "tracked_pose";
/// Output topic for odometry samples
pub const ODOM_TOPIC: &str = "raw_odom";
/// Output topic for transform samples
pub const TF_TOPIC: &str = "/tf";
/// Subscription and publisher queue depth
pub const QUEUE_DEPTH: usize = 50;

pub const ODOM_FRAME_ID: &str = "odom";
pub const BASE_FRAME_ID: &str = "base_footprint";

/// Estimator configuration.
///
/// The defaults reproduce the behavior of the base driver this estimator
/// replaces; every flag below is opt-in.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Factor applied to the linear velocity components only
    pub linear_scale: f64,
    /// Accept absolute pose overrides from an external localizer
    pub enable_pose_input: bool,
    /// Build and publish a transform record alongside each odometry sample
    pub publish_transform: bool,
    /// Use dt = 0 for the first velocity sample instead of the gap from the zero epoch
    pub seed_clock_on_first_sample: bool,
    /// Let absolute pose overrides also replace the integrated heading
    pub sync_heading_on_override: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            linear_scale: 1.0,
            enable_pose_input: false,
            publish_transform: false,
            seed_clock_on_first_sample: false,
            sync_heading_on_override: false,
        }
    }
}

impl EstimatorConfig {
    /// Apply numeric parameters. Flags are read as `0.0` (off) or anything else (on).
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        for (key, &value) in params {
            match key.as_str() {
                "linear_scale" => self.linear_scale = value,
                "enable_pose_input" => self.enable_pose_input = value != 0.0,
                "publish_transform" => self.publish_transform = value != 0.0,
                "seed_clock_on_first_sample" => self.seed_clock_on_first_sample = value != 0.0,
                "sync_heading_on_override" => self.sync_heading_on_override = value != 0.0,
                other => {
                    return Err(OdometryError::Config(format!(
                        "unknown parameter '{}'",
                        other
                    )))
                }
            }
        }
        self.validate()
    }

    /// Check the configuration before it reaches the estimator
    pub fn validate(&self) -> Result<()> {
        if !self.linear_scale.is_finite() {
            return Err(OdometryError::Config(format!(
                "linear_scale must be finite, got {}",
                self.linear_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_base_driver() {
        let config = EstimatorConfig::default();
        assert_eq!(config.linear_scale, 1.0);
        assert!(!config.enable_pose_input);
        assert!(!config.publish_transform);
        assert!(!config.seed_clock_on_first_sample);
        assert!(!config.sync_heading_on_override);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_configure_from_params() {
        let mut params = HashMap::new();
        params.insert("linear_scale".to_string(), 1.08);
        params.insert("publish_transform".to_string(), 1.0);
        params.insert("enable_pose_input".to_string(), 0.0);

        let mut config = EstimatorConfig::default();
        config.configure(&params).unwrap();

        assert_eq!(config.linear_scale, 1.08);
        assert!(config.publish_transform);
        assert!(!config.enable_pose_input);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut params = HashMap::new();
        params.insert("wheel_radius".to_string(), 0.05);

        let err = EstimatorConfig::default().configure(&params).unwrap_err();
        assert!(matches!(err, OdometryError::Config(_)));
    }

    #[test]
    fn test_non_finite_scale_rejected() {
        let config = EstimatorConfig {
            linear_scale: f64::NAN,
            ..EstimatorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
