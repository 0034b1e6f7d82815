//! # OrderFlow Core
//!
//! Durable order-lifecycle orchestration: explicit state machines drive an
//! order from receipt through validation, manual review, payment, and
//! shipping, with every side effect delegated to an idempotent action layer
//! backed by an append-only event log and a current-state aggregate store.
//!
//! ## Architecture
//!
//! - **models**: orders, payments, and domain events over SQLite (sqlx)
//! - **actions**: idempotent business steps; the only storage writers
//! - **execution**: per-step timeout, retry budget, backoff, fault injection
//! - **state_machine**: order and shipping lifecycles, signals, outcomes
//! - **orchestration**: run registry for start, signal, status, await
//!
//! Runs always resolve to one of three shapes (completed, cancelled, or
//! failed), and re-running a step never repeats a committed side effect.

pub mod actions;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod execution;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;

pub use config::{ConfigManager, OrderFlowConfig};
pub use database::Database;
pub use error::{OrderFlowError, Result};
pub use orchestration::{Orchestrator, RunStatus};
pub use state_machine::{RunOutcome, ShippingOutcome, SignalInbox, SignalKind};
