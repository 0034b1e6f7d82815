//! Controlled-failure injection.
//!
//! A [`FaultInjector`] runs before every underlying action: it either raises
//! a transient error, stalls long enough for the retry layer to observe a
//! timeout, or passes through. Production wiring uses [`NoopInjector`]; the
//! harness is swappable without touching action logic.

use crate::actions::ActionError;
use crate::config::FaultInjectionConfig;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[async_trait]
pub trait FaultInjector: Send + Sync {
    /// Called at the top of every action, before any storage work.
    async fn inject(&self, action: &str) -> Result<(), ActionError>;
}

/// Pass-through injector for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInjector;

#[async_trait]
impl FaultInjector for NoopInjector {
    async fn inject(&self, _action: &str) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Randomized injector: fails with `failure_probability`, stalls with
/// `stall_probability`, otherwise proceeds.
#[derive(Debug, Clone)]
pub struct ChaosInjector {
    failure_probability: f64,
    stall_probability: f64,
    stall_duration: Duration,
}

impl ChaosInjector {
    pub fn new(failure_probability: f64, stall_probability: f64, stall_duration: Duration) -> Self {
        Self {
            failure_probability,
            stall_probability,
            stall_duration,
        }
    }

    pub fn from_config(config: &FaultInjectionConfig) -> Self {
        Self::new(
            config.failure_probability,
            config.stall_probability,
            Duration::from_millis(config.stall_ms),
        )
    }
}

#[async_trait]
impl FaultInjector for ChaosInjector {
    async fn inject(&self, action: &str) -> Result<(), ActionError> {
        let roll: f64 = rand::random();

        if roll < self.failure_probability {
            debug!(action, roll, "injecting forced transient failure");
            return Err(ActionError::Fault {
                action: action.to_string(),
                reason: "forced failure for testing".to_string(),
            });
        }

        if roll < self.failure_probability + self.stall_probability {
            debug!(action, roll, stall_ms = self.stall_duration.as_millis() as u64, "injecting stall");
            // The retry layer's per-attempt timeout is expected to fire
            // before this completes.
            sleep(self.stall_duration).await;
        }

        Ok(())
    }
}
