//! # Structured Logging
//!
//! Environment-aware `tracing` initialization. Honors `RUST_LOG` when set,
//! otherwise falls back to a per-environment default level.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging exactly once.
///
/// Safe to call from tests, binaries, and library consumers alike; if a
/// global subscriber is already installed the call is a no-op.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = crate::config::detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_log_level(&environment)));

        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .try_init();

        if result.is_ok() {
            tracing::debug!(environment = %environment, "structured logging initialized");
        }
    });
}

/// Default log level for an environment when `RUST_LOG` is absent.
fn default_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}
