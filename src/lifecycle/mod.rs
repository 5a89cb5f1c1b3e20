//! Lifecycle management for odometry components

use crate::{OdometryError, Result};
use log::info;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, next: State) -> Result<()> {
        let allowed = matches!(
            (self.state, next),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
                | (State::Unconfigured, State::Finalized)
                | (State::Inactive, State::Finalized)
        );
        if !allowed {
            return Err(OdometryError::Lifecycle(format!(
                "{}: cannot go from {:?} to {:?}",
                self.name, self.state, next
            )));
        }
        info!("{}: {:?} -> {:?}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_lifecycle() {
        let mut base = LifecycleNodeBase::new("test");
        assert_eq!(base.get_state(), State::Unconfigured);
        base.transition(State::Inactive).unwrap();
        base.transition(State::Active).unwrap();
        base.transition(State::Inactive).unwrap();
        base.transition(State::Unconfigured).unwrap();
        base.transition(State::Finalized).unwrap();
        assert_eq!(base.get_state(), State::Finalized);
    }

    #[test]
    fn test_cannot_activate_unconfigured() {
        let mut base = LifecycleNodeBase::new("test");
        let err = base.transition(State::Active).unwrap_err();
        assert!(matches!(err, OdometryError::Lifecycle(_)));
        assert_eq!(base.get_state(), State::Unconfigured);
    }
}
