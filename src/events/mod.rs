//! In-process lifecycle event fan-out.
//!
//! Distinct from the persisted event log ([`crate::models::event`]): the
//! publisher carries transient state-transition notifications to in-process
//! subscribers and is not a durability mechanism.

pub mod publisher;

pub use publisher::{EventPublisher, StateTransition};

/// Topic names published by the state machines.
pub mod topics {
    pub const ORDER_STATE_CHANGED: &str = "order.state_changed";
    pub const SHIPPING_STATE_CHANGED: &str = "shipping.state_changed";
}
