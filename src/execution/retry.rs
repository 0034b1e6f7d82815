//! Bounded retry with timeout and exponential backoff.
//!
//! Transient errors (storage failures, injected faults, timeouts) consume
//! attempts from the budget; business-rule violations surface immediately
//! without retry. Once the budget is exhausted the last transient error is
//! escalated to the caller.

use crate::actions::ActionError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Retry budget for a single delegated action.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (must be at least 1).
    pub max_attempts: u32,
    /// Per-attempt timeout; a stalled attempt is cut off and counted as a
    /// transient failure.
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Runs action closures under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct ActionInvoker {
    policy: RetryPolicy,
}

impl ActionInvoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `attempt` until it succeeds, fails a business rule, or the
    /// retry budget is exhausted.
    pub async fn invoke<T, F, Fut>(&self, action: &str, mut attempt: F) -> Result<T, ActionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ActionError>>,
    {
        let mut backoff = self.policy.initial_backoff;
        let mut last_error: Option<ActionError> = None;

        for attempt_number in 1..=self.policy.max_attempts {
            match timeout(self.policy.timeout, attempt()).await {
                Ok(Ok(value)) => {
                    if attempt_number > 1 {
                        debug!(action, attempt = attempt_number, "action succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(error)) if !error.is_retryable() => {
                    debug!(action, %error, "business-rule violation, not retrying");
                    return Err(error);
                }
                Ok(Err(error)) => {
                    warn!(
                        action,
                        attempt = attempt_number,
                        max_attempts = self.policy.max_attempts,
                        %error,
                        "transient action failure"
                    );
                    last_error = Some(error);
                }
                Err(_elapsed) => {
                    warn!(
                        action,
                        attempt = attempt_number,
                        max_attempts = self.policy.max_attempts,
                        timeout_ms = self.policy.timeout.as_millis() as u64,
                        "action timed out"
                    );
                    last_error = Some(ActionError::Timeout(self.policy.timeout));
                }
            }

            if attempt_number < self.policy.max_attempts {
                sleep(backoff).await;
                backoff = backoff
                    .mul_f64(self.policy.backoff_multiplier)
                    .min(self.policy.max_backoff);
            }
        }

        Err(last_error.unwrap_or(ActionError::Timeout(self.policy.timeout)))
    }
}
