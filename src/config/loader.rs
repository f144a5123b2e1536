//! Configuration Loader
//!
//! Layers an optional TOML file and `MIGRATION__*` environment variables over
//! the built-in defaults, then validates the result.

use super::MigrationConfig;
use crate::error::MigrationResult;
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides, e.g. `MIGRATION__RECOVERY__MAX_RETRIES=5`
pub const ENV_PREFIX: &str = "MIGRATION";

impl MigrationConfig {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> MigrationResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading migration configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: MigrationConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            max_retries = config.recovery.max_retries,
            retry_delay_ms = config.recovery.retry_delay_ms,
            max_checkpoints = config.checkpoints.max_checkpoints,
            max_history = config.progress.max_history,
            "Migration configuration loaded"
        );

        Ok(config)
    }

    /// Parse configuration from a TOML string without consulting the environment
    pub fn from_toml_str(source: &str) -> MigrationResult<Self> {
        let config: MigrationConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
