//! Single-consumer estimator task
//!
//! Velocity and absolute pose inputs from any number of producers are funnelled
//! through one channel, so the estimator sees them strictly one at a time in
//! arrival order.

use super::sample::{OdometrySample, TransformSample};
use super::PoseEstimator;
use crate::common::{AbsolutePoseInput, Timestamp, VelocityInput};
use crate::{OdometryError, Result};
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Input accepted by the estimator task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimatorInput {
    Velocity(VelocityInput, Timestamp),
    AbsolutePose(AbsolutePoseInput, Timestamp),
}

/// Output produced for every processed input
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub odometry: OdometrySample,
    /// Present only when transform publishing is enabled
    pub transform: Option<TransformSample>,
}

/// Cloneable producer side of the estimator task
#[derive(Debug, Clone)]
pub struct EstimatorHandle {
    tx: mpsc::Sender<EstimatorInput>,
}

impl EstimatorHandle {
    pub async fn send_velocity(&self, velocity: VelocityInput, stamp: Timestamp) -> Result<()> {
        self.send(EstimatorInput::Velocity(velocity, stamp)).await
    }

    pub async fn send_pose(&self, pose: AbsolutePoseInput, stamp: Timestamp) -> Result<()> {
        self.send(EstimatorInput::AbsolutePose(pose, stamp)).await
    }

    pub async fn send(&self, input: EstimatorInput) -> Result<()> {
        self.tx
            .send(input)
            .await
            .map_err(|_| OdometryError::ChannelClosed)
    }
}

/// Task owning a [`PoseEstimator`]
pub struct EstimatorTask {
    estimator: PoseEstimator,
    rx: mpsc::Receiver<EstimatorInput>,
    output: mpsc::Sender<Emission>,
}

impl EstimatorTask {
    /// Spawn the task on the current tokio runtime.
    ///
    /// The task exits once every [`EstimatorHandle`] has been dropped and the
    /// queued inputs are drained. It hands back the estimator so its final
    /// state can be inspected.
    pub fn spawn(
        estimator: PoseEstimator,
        capacity: usize,
    ) -> (
        EstimatorHandle,
        mpsc::Receiver<Emission>,
        JoinHandle<PoseEstimator>,
    ) {
        let (tx, rx) = mpsc::channel(capacity);
        let (output, output_rx) = mpsc::channel(capacity);
        let task = EstimatorTask {
            estimator,
            rx,
            output,
        };
        let join = tokio::spawn(task.run());
        (EstimatorHandle { tx }, output_rx, join)
    }

    async fn run(mut self) -> PoseEstimator {
        while let Some(input) = self.rx.recv().await {
            let emission = self.process(input);
            // Downstream backpressure is not our concern: drop and move on
            match self.output.try_send(emission) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(dropped)) => {
                    warn!(
                        "Odometry output full, dropping sample stamped {:?}",
                        dropped.odometry.stamp
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Odometry output receiver dropped");
                }
            }
        }
        self.estimator
    }

    fn process(&mut self, input: EstimatorInput) -> Emission {
        let odometry = match input {
            EstimatorInput::Velocity(velocity, stamp) => self.estimator.integrate(velocity, stamp),
            EstimatorInput::AbsolutePose(pose, stamp) => self.estimator.ingest(pose, stamp),
        };
        let transform = self
            .estimator
            .config()
            .publish_transform
            .then(|| odometry.to_transform());
        Emission {
            odometry,
            transform,
        }
    }
}
