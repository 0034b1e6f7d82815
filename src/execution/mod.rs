//! # Action Execution
//!
//! In-process stand-in for the durable-execution substrate's delivery
//! contract: each delegated action runs under a caller-specified timeout with
//! a bounded retry budget and exponential backoff ([`retry::ActionInvoker`]),
//! and a swappable fault injector ([`fault_injection::FaultInjector`])
//! exercises that contract under realistic failure distributions.

pub mod fault_injection;
pub mod retry;

pub use fault_injection::{ChaosInjector, FaultInjector, NoopInjector};
pub use retry::{ActionInvoker, RetryPolicy};
