//! Run outcomes.
//!
//! Callers always receive one of exactly three shapes from an order run
//! (completed, cancelled, or failed), never a raw error or a panic.

use crate::actions::ShippingStarted;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal result of an order lifecycle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { shipping: ShippingStarted },
    Cancelled { reason: String },
    Failed { reason: FailureReason, detail: Option<String> },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The coarse status label reported by the orchestrator's status query.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Why a run failed. Validation failures are business outcomes; everything
/// else that escapes an action's retry budget lands in `WorkflowError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ValidationFailed,
    WorkflowError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::WorkflowError => write!(f, "workflow_error"),
        }
    }
}

/// Terminal result of a shipping lifecycle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShippingOutcome {
    Delivered {
        carrier: String,
        service: String,
        tracking_number: String,
        delivery_date: DateTime<Utc>,
    },
    Cancelled {
        reason: String,
    },
    Failed {
        detail: String,
    },
}

impl ShippingOutcome {
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}
