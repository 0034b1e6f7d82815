//! Crate-level error types.
//!
//! The action layer has its own taxonomy ([`crate::actions::ActionError`])
//! distinguishing transient faults from business-rule violations; this module
//! covers everything outside a running lifecycle: configuration, database
//! bootstrap, and orchestrator registry misuse.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigurationError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no run registered for order {0}")]
    UnknownRun(String),

    #[error("a run already exists for order {0}")]
    DuplicateRun(String),

    #[error("orchestration error: {0}")]
    Orchestration(String),
}

pub type Result<T> = std::result::Result<T, OrderFlowError>;
