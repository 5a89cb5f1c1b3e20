pub mod common;
pub mod config;
pub mod error;
pub mod estimation;
pub mod lifecycle;

pub use crate::common::{AbsolutePoseInput, Pose2D, Timestamp, Twist2D, VelocityInput};
pub use crate::config::EstimatorConfig;
pub use crate::error::{OdometryError, Result};
pub use crate::estimation::sample::{OdometrySample, TransformSample};
pub use crate::estimation::{PoseEstimator, SharedEstimator};

use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};

/// Odometry component for the robot base
pub struct OdometryStack {
    base: LifecycleNodeBase,
    config: EstimatorConfig,
    estimator: SharedEstimator,
}

impl OdometryStack {
    /// Create a new odometry stack
    pub fn new(config: EstimatorConfig) -> Self {
        OdometryStack {
            base: LifecycleNodeBase::new("odometry_stack"),
            estimator: SharedEstimator::new(PoseEstimator::new(config.clone())),
            config,
        }
    }

    /// Configure and activate the stack
    pub fn init(&mut self) -> Result<()> {
        self.on_configure()?;
        self.on_activate()
    }

    /// Deactivate and clean up the stack
    pub fn shutdown(&mut self) -> Result<()> {
        self.on_deactivate()?;
        self.on_cleanup()
    }

    pub fn state(&self) -> State {
        self.base.get_state()
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Handle to the estimator shared with input callbacks
    pub fn estimator(&self) -> SharedEstimator {
        self.estimator.clone()
    }

    /// Process a velocity sample
    pub fn handle_velocity(
        &self,
        velocity: VelocityInput,
        stamp: Timestamp,
    ) -> Result<OdometrySample> {
        self.ensure_active()?;
        Ok(self.estimator.integrate(velocity, stamp))
    }

    /// Process an absolute pose sample
    pub fn handle_pose(
        &self,
        pose: AbsolutePoseInput,
        stamp: Timestamp,
    ) -> Result<OdometrySample> {
        self.ensure_active()?;
        Ok(self.estimator.ingest(pose, stamp))
    }

    fn ensure_active(&self) -> Result<()> {
        match self.base.get_state() {
            State::Active => Ok(()),
            state => Err(OdometryError::NotActive(state)),
        }
    }
}

impl LifecycleNode for OdometryStack {
    fn on_configure(&mut self) -> Result<()> {
        if let Err(e) = self.config.validate() {
            log::warn!("Rejecting odometry configuration: {}", e);
            return Err(e);
        }
        self.estimator = SharedEstimator::new(PoseEstimator::new(self.config.clone()));
        self.base.transition(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<()> {
        self.base.transition(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<()> {
        self.base.transition(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<()> {
        self.estimator.reset();
        self.base.transition(State::Unconfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_rejects_input_before_activation() {
        let stack = OdometryStack::new(EstimatorConfig::default());
        let err = stack
            .handle_velocity(VelocityInput::default(), Timestamp::ZERO)
            .unwrap_err();
        assert_eq!(err, OdometryError::NotActive(State::Unconfigured));
    }

    #[test]
    fn test_stack_processes_input_when_active() {
        let mut stack = OdometryStack::new(EstimatorConfig::default());
        stack.init().unwrap();
        assert_eq!(stack.state(), State::Active);

        let sample = stack
            .handle_velocity(VelocityInput::new(1.0, 0.0, 0.0), Timestamp::from_secs_f64(1.0))
            .unwrap();
        assert_eq!(sample.position.x, 1.0);

        stack.shutdown().unwrap();
        assert_eq!(stack.state(), State::Unconfigured);
        assert_eq!(stack.estimator().pose(), Pose2D::default());
    }

    #[test]
    fn test_invalid_config_fails_configure() {
        let mut stack = OdometryStack::new(EstimatorConfig {
            linear_scale: f64::INFINITY,
            ..EstimatorConfig::default()
        });
        assert!(matches!(stack.init(), Err(OdometryError::Config(_))));
        assert_eq!(stack.state(), State::Unconfigured);
    }
}
