//! # Orchestration
//!
//! Ties the layers together: owns the database pool, event publisher, fault
//! injector, and configuration, and tracks every in-flight run in a registry
//! keyed by order id so callers can signal, query, and await runs.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunStatus};
