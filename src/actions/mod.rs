//! # Idempotent Action Layer
//!
//! Every side-effecting business step is safe to invoke more than once for
//! the same key: actions check the aggregate store and event log before
//! performing writes, and a re-attempt of a committed step short-circuits
//! with `already_processed = true` instead of repeating the side effect.
//!
//! This layer is the only writer of order, payment, and event rows. The
//! state machines never touch storage directly; they invoke named actions
//! and interpret the results.

pub mod order_actions;
pub mod shipping_actions;

use std::time::Duration;
use thiserror::Error;

pub use order_actions::{ChargeOutcome, OrderActions, ReceiveOutcome, ShippingStarted, Validation};
pub use shipping_actions::{
    CarrierSelection, DeliveryConfirmation, PackageResult, PickResult, ShippingActions,
    TrackingAssignment,
};

/// Failure taxonomy for delegated actions.
///
/// Transient variants are retried by the invoker's budget; a
/// [`ActionError::BusinessRule`] surfaces immediately and terminates the run
/// with a typed failure. Idempotent short-circuits are success values, not
/// errors.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Storage-transaction failure; the transaction was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Forced failure from the controlled-failure harness.
    #[error("injected fault in {action}: {reason}")]
    Fault { action: String, reason: String },

    /// The per-attempt timeout fired; applied by the invoker, never raised
    /// by an action itself.
    #[error("action timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid domain state (missing order, wrong status). Never retried.
    #[error("business rule violation: {0}")]
    BusinessRule(String),
}

impl ActionError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::BusinessRule(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rule_violations_are_not_retryable() {
        assert!(!ActionError::BusinessRule("order not found".to_string()).is_retryable());
    }

    #[test]
    fn test_transient_variants_are_retryable() {
        assert!(ActionError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(ActionError::Fault {
            action: "receive_order".to_string(),
            reason: "forced failure".to_string(),
        }
        .is_retryable());
        assert!(ActionError::Storage(sqlx::Error::PoolClosed).is_retryable());
    }
}
