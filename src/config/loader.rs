//! Configuration Loader
//!
//! Layered configuration loading: serde defaults, then an optional TOML
//! file, then `ORDERFLOW_*` environment overrides (double underscore as the
//! section separator, e.g. `ORDERFLOW_EXECUTION__STEP_TIMEOUT_MS=2000`).

use super::{detect_environment, ConfigurationError, OrderFlowConfig};
use config::{Config, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct ConfigManager {
    config: OrderFlowConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection, looking for
    /// `config/orderflow.toml` relative to the working directory.
    pub fn load() -> Result<Arc<ConfigManager>, ConfigurationError> {
        Self::load_from_file(None)
    }

    /// Load configuration from an explicit file path. Useful for tests that
    /// must not depend on the process working directory.
    pub fn load_from_file(path: Option<&Path>) -> Result<Arc<ConfigManager>, ConfigurationError> {
        let environment = detect_environment();

        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("config/orderflow").required(false)),
        };
        builder = builder.add_source(Environment::with_prefix("ORDERFLOW").separator("__"));

        let config: OrderFlowConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            environment = %environment,
            database = %config.database.filename,
            step_timeout_ms = config.execution.step_timeout_ms,
            "configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment,
        }))
    }

    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_without_file_uses_defaults() {
        let manager = ConfigManager::load_from_file(None).unwrap();
        assert_eq!(manager.config().execution.receive_max_attempts, 3);
    }

    #[test]
    fn test_load_from_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orderflow.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[execution]\nstep_timeout_ms = 1234\n\n[timers]\nmanual_review_ms = 50\n"
        )
        .unwrap();

        let manager = ConfigManager::load_from_file(Some(&path)).unwrap();
        assert_eq!(manager.config().execution.step_timeout_ms, 1234);
        assert_eq!(manager.config().timers.manual_review_ms, 50);
        // Untouched sections keep their defaults.
        assert_eq!(manager.config().execution.charge_max_attempts, 3);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orderflow.toml");
        std::fs::write(&path, "[execution]\ncharge_max_attempts = 0\n").unwrap();

        assert!(ConfigManager::load_from_file(Some(&path)).is_err());
    }
}
