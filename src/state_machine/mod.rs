//! # State Machine
//!
//! Explicit-transition state machines for the order lifecycle and its
//! shipping sub-process, the signal inbox they consult at checkpoints, and
//! the structured outcomes their runs resolve to.

pub mod errors;
pub mod events;
pub mod order_lifecycle;
pub mod outcome;
pub mod shipping_lifecycle;
pub mod signals;
pub mod states;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::{next_order_state, next_shipping_state, OrderLifecycleEvent, ShippingLifecycleEvent};
pub use order_lifecycle::OrderLifecycle;
pub use outcome::{FailureReason, RunOutcome, ShippingOutcome};
pub use shipping_lifecycle::ShippingLifecycle;
pub use signals::{SignalInbox, SignalKind};
pub use states::{OrderState, ShippingState};
