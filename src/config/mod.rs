//! # Configuration
//!
//! Explicit, validated configuration for the orchestration core. Values are
//! layered: serde defaults, then an optional `config/orderflow.toml`, then
//! `ORDERFLOW_*` environment overrides (see [`loader::ConfigManager`]).
//!
//! Defaults mirror the reference deployment: 5s step timeouts, per-step
//! retry ceilings of 3/2/3/2 attempts, a 3s manual-review window, and a
//! fault-injection harness that is disabled unless explicitly enabled.

pub mod loader;

use crate::execution::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use loader::ConfigManager;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("failed to load configuration: {0}")]
    LoadFailed(#[from] config::ConfigError),
}

/// Detect the current environment from `ORDERFLOW_ENV` / `APP_ENV`.
pub fn detect_environment() -> String {
    env::var("ORDERFLOW_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Root configuration for the orchestration core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFlowConfig {
    pub database: DatabaseConfig,
    pub execution: ExecutionConfig,
    pub timers: TimerConfig,
    pub fault_injection: FaultInjectionConfig,
}

impl OrderFlowConfig {
    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.execution.validate()?;
        self.fault_injection.validate()?;
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "database.max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// SQLite connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path. In-memory databases do not survive restarts and
    /// defeat the durability contract; use a file path outside of tests.
    pub filename: String,
    pub max_connections: u32,
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            filename: "orderflow.db".to_string(),
            max_connections: 5,
            create_if_missing: true,
        }
    }
}

/// Per-step retry budgets and timeouts for delegated actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub step_timeout_ms: u64,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub receive_max_attempts: u32,
    pub validate_max_attempts: u32,
    pub charge_max_attempts: u32,
    pub shipping_max_attempts: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 5_000,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 2_000,
            receive_max_attempts: 3,
            validate_max_attempts: 2,
            charge_max_attempts: 3,
            shipping_max_attempts: 2,
        }
    }
}

impl ExecutionConfig {
    pub fn receive_policy(&self) -> RetryPolicy {
        self.policy(self.receive_max_attempts)
    }

    pub fn validate_policy(&self) -> RetryPolicy {
        self.policy(self.validate_max_attempts)
    }

    pub fn charge_policy(&self) -> RetryPolicy {
        self.policy(self.charge_max_attempts)
    }

    pub fn shipping_policy(&self) -> RetryPolicy {
        self.policy(self.shipping_max_attempts)
    }

    fn policy(&self, max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            timeout: Duration::from_millis(self.step_timeout_ms),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, attempts) in [
            ("execution.receive_max_attempts", self.receive_max_attempts),
            ("execution.validate_max_attempts", self.validate_max_attempts),
            ("execution.charge_max_attempts", self.charge_max_attempts),
            ("execution.shipping_max_attempts", self.shipping_max_attempts),
        ] {
            if attempts == 0 {
                return Err(ConfigurationError::InvalidValue {
                    field: field.to_string(),
                    reason: "retry budget must allow at least one attempt".to_string(),
                });
            }
        }
        if self.step_timeout_ms == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "execution.step_timeout_ms".to_string(),
                reason: "step timeout must be positive".to_string(),
            });
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ConfigurationError::InvalidValue {
                field: "execution.backoff_multiplier".to_string(),
                reason: "multiplier below 1.0 would shrink backoff".to_string(),
            });
        }
        Ok(())
    }
}

/// Durations for the timed waits inside the order lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Bounded manual-review window; auto-completes when it elapses.
    pub manual_review_ms: u64,
    /// Modeled payment-gateway latency before the charge is attempted.
    pub payment_processing_delay_ms: u64,
    /// Modeled warehouse handoff latency before shipping starts.
    pub shipping_setup_delay_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            manual_review_ms: 3_000,
            payment_processing_delay_ms: 500,
            shipping_setup_delay_ms: 500,
        }
    }
}

impl TimerConfig {
    pub fn manual_review(&self) -> Duration {
        Duration::from_millis(self.manual_review_ms)
    }

    pub fn payment_processing_delay(&self) -> Duration {
        Duration::from_millis(self.payment_processing_delay_ms)
    }

    pub fn shipping_setup_delay(&self) -> Duration {
        Duration::from_millis(self.shipping_setup_delay_ms)
    }
}

/// Controlled-failure injection for exercising the retry/idempotency
/// contract. Disabled by default; production wiring uses the noop injector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultInjectionConfig {
    pub enabled: bool,
    /// Probability of a forced transient failure per action call.
    pub failure_probability: f64,
    /// Probability of an indefinite stall the step timeout must catch.
    pub stall_probability: f64,
    pub stall_ms: u64,
}

impl Default for FaultInjectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_probability: 0.33,
            stall_probability: 0.34,
            stall_ms: 300_000,
        }
    }
}

impl FaultInjectionConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, p) in [
            ("fault_injection.failure_probability", self.failure_probability),
            ("fault_injection.stall_probability", self.stall_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigurationError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("probability {p} outside [0.0, 1.0]"),
                });
            }
        }
        if self.failure_probability + self.stall_probability > 1.0 {
            return Err(ConfigurationError::InvalidValue {
                field: "fault_injection".to_string(),
                reason: "failure and stall probabilities sum above 1.0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrderFlowConfig::default();
        config.validate().unwrap();
        assert_eq!(config.execution.receive_max_attempts, 3);
        assert_eq!(config.execution.validate_max_attempts, 2);
        assert_eq!(config.timers.manual_review_ms, 3_000);
        assert!(!config.fault_injection.enabled);
    }

    #[test]
    fn test_zero_attempt_budget_rejected() {
        let mut config = OrderFlowConfig::default();
        config.execution.charge_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probability_bounds_enforced() {
        let mut config = OrderFlowConfig::default();
        config.fault_injection.failure_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = OrderFlowConfig::default();
        config.fault_injection.failure_probability = 0.7;
        config.fault_injection.stall_probability = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policies_reflect_budgets() {
        let execution = ExecutionConfig::default();
        assert_eq!(execution.receive_policy().max_attempts, 3);
        assert_eq!(execution.charge_policy().max_attempts, 3);
        assert_eq!(
            execution.shipping_policy().timeout,
            Duration::from_millis(5_000)
        );
    }
}
