use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle states: linear forward progression with terminal escape
/// branches reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Initial state before the receive step commits
    Pending,
    /// Order row created
    Received,
    /// Item list checked and non-empty
    Validated,
    /// Bounded manual-review window in progress
    UnderReview,
    /// Payment row committed
    PaymentCharged,
    /// Shipping handoff committed
    ShippingStarted,
    /// Run finished successfully
    Completed,
    /// Run stopped by a cancel signal
    Cancelled,
    /// Run stopped by a business failure or exhausted retry budget
    Failed,
}

impl OrderState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Position in the forward progression; terminal escapes have none.
    pub fn sequence_index(&self) -> Option<usize> {
        match self {
            Self::Pending => Some(0),
            Self::Received => Some(1),
            Self::Validated => Some(2),
            Self::UnderReview => Some(3),
            Self::PaymentCharged => Some(4),
            Self::ShippingStarted => Some(5),
            Self::Completed => Some(6),
            Self::Cancelled | Self::Failed => None,
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Received => write!(f, "received"),
            Self::Validated => write!(f, "validated"),
            Self::UnderReview => write!(f, "under_review"),
            Self::PaymentCharged => write!(f, "payment_charged"),
            Self::ShippingStarted => write!(f, "shipping_started"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "received" => Ok(Self::Received),
            "validated" => Ok(Self::Validated),
            "under_review" => Ok(Self::UnderReview),
            "payment_charged" => Ok(Self::PaymentCharged),
            "shipping_started" => Ok(Self::ShippingStarted),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid order state: {s}")),
        }
    }
}

impl Default for OrderState {
    fn default() -> Self {
        Self::Pending
    }
}

/// Shipping lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingState {
    Pending,
    Picked,
    Packaged,
    CarrierSelected,
    TrackingGenerated,
    Delivered,
    Cancelled,
    Failed,
}

impl ShippingState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for ShippingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Picked => write!(f, "picked"),
            Self::Packaged => write!(f, "packaged"),
            Self::CarrierSelected => write!(f, "carrier_selected"),
            Self::TrackingGenerated => write!(f, "tracking_generated"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ShippingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "picked" => Ok(Self::Picked),
            "packaged" => Ok(Self::Packaged),
            "carrier_selected" => Ok(Self::CarrierSelected),
            "tracking_generated" => Ok(Self::TrackingGenerated),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid shipping state: {s}")),
        }
    }
}

impl Default for ShippingState {
    fn default() -> Self {
        Self::Pending
    }
}
