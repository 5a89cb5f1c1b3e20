//! Error types for the odometry stack

use crate::lifecycle::State;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdometryError>;

/// Errors raised around the estimator. The integration math itself never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdometryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Odometry stack is not active (state: {0:?})")]
    NotActive(State),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    #[error("Estimator input channel closed")]
    ChannelClosed,
}
