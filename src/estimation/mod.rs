//! Dead-reckoning pose estimation for the robot base
//!
//! Two update paths write the same pose state:
//! - [`PoseEstimator::integrate`] dead-reckons from body-frame velocities.
//! - [`PoseEstimator::ingest`] overwrites the position from an external
//!   absolute pose, flipping its heading by pi.
//!
//! The override path leaves the integrated heading and the last velocity in
//! place unless `sync_heading_on_override` is set, so samples emitted from it
//! carry the twist of the most recent velocity input. Non-finite inputs are
//! not filtered and propagate into the pose.
pub mod sample;
pub mod task;

use self::sample::{build_sample, OdometrySample};
use crate::common::{
    quaternion_from_rpy, quaternion_to_rpy, yaw_to_quaternion, AbsolutePoseInput, Pose2D,
    Timestamp, Twist2D, VelocityInput,
};
use crate::config::EstimatorConfig;
use log::{debug, trace};
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Owner of the robot pose state
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    config: EstimatorConfig,
    pose: Pose2D,
    twist: Twist2D,
    last_update_time: Timestamp,
    seen_velocity: bool,
}

impl PoseEstimator {
    /// Create an estimator at the origin with the clock at the zero epoch
    pub fn new(config: EstimatorConfig) -> Self {
        PoseEstimator {
            config,
            pose: Pose2D::default(),
            twist: Twist2D::default(),
            last_update_time: Timestamp::ZERO,
            seen_velocity: false,
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Current pose estimate
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Last scaled velocity
    pub fn twist(&self) -> Twist2D {
        self.twist
    }

    pub fn last_update_time(&self) -> Timestamp {
        self.last_update_time
    }

    /// Return to the origin and the zero epoch
    pub fn reset(&mut self) {
        self.pose = Pose2D::default();
        self.twist = Twist2D::default();
        self.last_update_time = Timestamp::ZERO;
        self.seen_velocity = false;
    }

    /// Dead-reckon the pose forward with a velocity sample.
    ///
    /// The displacement is rotated into the odometry frame using the heading
    /// from before this update. The first call measures dt from the zero
    /// epoch, so it moves the pose by the whole gap unless
    /// `seed_clock_on_first_sample` is set.
    pub fn integrate(&mut self, velocity: VelocityInput, stamp: Timestamp) -> OdometrySample {
        self.twist = Twist2D {
            linear_x: velocity.linear_x * self.config.linear_scale,
            linear_y: velocity.linear_y * self.config.linear_scale,
            angular_z: velocity.angular_z,
        };

        let dt = if self.config.seed_clock_on_first_sample && !self.seen_velocity {
            0.0
        } else {
            stamp - self.last_update_time
        };
        self.last_update_time = stamp;
        self.seen_velocity = true;
        trace!("velocity dt = {:.6}s", dt);

        let (sin_heading, cos_heading) = self.pose.heading.sin_cos();
        let delta_heading = self.twist.angular_z * dt;
        let delta_x = (self.twist.linear_x * cos_heading - self.twist.linear_y * sin_heading) * dt;
        let delta_y = (self.twist.linear_x * sin_heading + self.twist.linear_y * cos_heading) * dt;

        self.pose.x += delta_x;
        self.pose.y += delta_y;
        self.pose.heading += delta_heading;

        debug!(
            "Integrated pose: x={:.3}, y={:.3}, heading={:.3}",
            self.pose.x, self.pose.y, self.pose.heading
        );

        build_sample(
            stamp,
            self.pose.x,
            self.pose.y,
            yaw_to_quaternion(self.pose.heading),
            self.twist,
        )
    }

    /// Overwrite the position with an absolute pose.
    ///
    /// The reported orientation is turned by pi about the vertical axis. No
    /// dt is involved and the velocity clock is not touched.
    pub fn ingest(&mut self, input: AbsolutePoseInput, stamp: Timestamp) -> OdometrySample {
        let (roll, pitch, yaw) = quaternion_to_rpy(&input.orientation);
        let inverted = quaternion_from_rpy(roll, pitch, yaw + PI);

        self.pose.x = input.position.x;
        self.pose.y = input.position.y;
        if self.config.sync_heading_on_override {
            self.pose.heading = yaw + PI;
        }

        debug!(
            "Absolute pose override: x={:.3}, y={:.3}, yaw={:.3}",
            self.pose.x,
            self.pose.y,
            yaw + PI
        );

        build_sample(stamp, self.pose.x, self.pose.y, inverted, self.twist)
    }
}

/// Estimator handle that serializes updates from concurrent producers
#[derive(Debug, Clone)]
pub struct SharedEstimator {
    inner: Arc<Mutex<PoseEstimator>>,
}

impl SharedEstimator {
    pub fn new(estimator: PoseEstimator) -> Self {
        SharedEstimator {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    // Every update runs to completion under the lock, so a poisoned
    // estimator still holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, PoseEstimator> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn integrate(&self, velocity: VelocityInput, stamp: Timestamp) -> OdometrySample {
        self.lock().integrate(velocity, stamp)
    }

    pub fn ingest(&self, input: AbsolutePoseInput, stamp: Timestamp) -> OdometrySample {
        self.lock().ingest(input, stamp)
    }

    pub fn pose(&self) -> Pose2D {
        self.lock().pose()
    }

    pub fn twist(&self) -> Twist2D {
        self.lock().twist()
    }

    pub fn reset(&self) {
        self.lock().reset()
    }
}
