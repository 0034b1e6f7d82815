//! # Data Layer
//!
//! Aggregate rows (orders, payments) and the append-only event log. These
//! models are written exclusively by the idempotent action layer
//! ([`crate::actions`]); the state machines never touch storage directly.
//!
//! Every mutation has a `_with_transaction` variant so an aggregate update
//! and its event-log append can commit atomically.

pub mod event;
pub mod order;
pub mod payment;

pub use event::{DomainEvent, NewDomainEvent};
pub use order::{Address, LineItem, NewOrder, Order, OrderRequest};
pub use payment::{NewPayment, Payment};
