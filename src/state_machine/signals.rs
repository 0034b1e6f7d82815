//! Signal inbox.
//!
//! Signals arrive asynchronously and are merged into a per-run inbox: a
//! last-write-wins map from signal kind to latest payload. Handlers never
//! block and never touch storage; the state machine observes the inbox at
//! its checkpoints, so a signal landing between two checkpoints takes
//! effect at the next one and never retroactively undoes a committed step.
//!
//! A `Notify` rides along so timed waits can be interrupted the moment a
//! cancel arrives instead of polling on an interval.

use crate::models::Address;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Out-of-band control signals accepted by the lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    CancelOrder,
    UpdateAddress,
    CancelPayment,
    CancelShipping,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CancelOrder => write!(f, "cancel_order"),
            Self::UpdateAddress => write!(f, "update_address"),
            Self::CancelPayment => write!(f, "cancel_payment"),
            Self::CancelShipping => write!(f, "cancel_shipping"),
        }
    }
}

impl std::str::FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cancel_order" => Ok(Self::CancelOrder),
            "update_address" => Ok(Self::UpdateAddress),
            "cancel_payment" => Ok(Self::CancelPayment),
            "cancel_shipping" => Ok(Self::CancelShipping),
            _ => Err(format!("Invalid signal kind: {s}")),
        }
    }
}

#[derive(Default)]
struct InboxInner {
    latest: Mutex<HashMap<SignalKind, Value>>,
    notify: Notify,
}

/// Per-run signal inbox; cheap to clone and share with signal producers.
#[derive(Clone, Default)]
pub struct SignalInbox {
    inner: Arc<InboxInner>,
}

impl SignalInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signal (last write wins) and wake any interruptible wait.
    pub fn deliver(&self, kind: SignalKind, payload: Value) {
        debug!(signal = %kind, "signal delivered to inbox");
        self.inner.latest.lock().insert(kind, payload);
        self.inner.notify.notify_waiters();
    }

    /// Whether a signal of this kind has been observed.
    pub fn is_set(&self, kind: SignalKind) -> bool {
        self.inner.latest.lock().contains_key(&kind)
    }

    /// Latest payload for a signal kind, if any.
    pub fn payload(&self, kind: SignalKind) -> Option<Value> {
        self.inner.latest.lock().get(&kind).cloned()
    }

    pub fn cancel_requested(&self) -> bool {
        self.is_set(SignalKind::CancelOrder)
    }

    pub fn payment_cancel_requested(&self) -> bool {
        self.is_set(SignalKind::CancelPayment)
    }

    pub fn shipping_cancel_requested(&self) -> bool {
        self.is_set(SignalKind::CancelShipping)
    }

    /// The most recent proposed shipping address, if an update signal has
    /// arrived and its payload parses as an address.
    pub fn proposed_address(&self) -> Option<Address> {
        self.payload(SignalKind::UpdateAddress)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Resolve once a signal of the given kind is present. Returns
    /// immediately if it already is.
    pub async fn observed(&self, kind: SignalKind) {
        let mut notified = std::pin::pin!(self.inner.notify.notified());
        loop {
            // Register interest before checking, so a deliver racing this
            // check cannot slip through unobserved.
            notified.as_mut().enable();
            if self.is_set(kind) {
                return;
            }
            notified.as_mut().await;
            notified.set(self.inner.notify.notified());
        }
    }
}
