//! # Migration Core Configuration
//!
//! Typed configuration for the three resilience components. Every section has
//! defaults, so an empty file (or no file at all) yields a usable configuration.
//!
//! ## Layering
//!
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. `MIGRATION__<SECTION>__<KEY>` environment variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use migration_core::config::MigrationConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MigrationConfig::load(None)?;
//! println!("max retries: {}", config.recovery.max_retries);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::error::{MigrationError, MigrationResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Retry behavior for the recovery orchestrator
    pub recovery: RecoveryConfig,

    /// Retention for the checkpoint store
    pub checkpoints: CheckpointConfig,

    /// History retention for the progress tracker
    pub progress: ProgressConfig,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Additional attempts allowed after the first one
    pub max_retries: u32,

    /// Fixed delay between attempts, used when no backoff is configured
    pub retry_delay_ms: u64,

    /// Switches the orchestrator to exponential backoff when present
    pub backoff: Option<BackoffConfig>,
}

impl RecoveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            backoff: None,
        }
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Upper bound on retained checkpoints; oldest are evicted first
    pub max_checkpoints: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_checkpoints: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Number of finished operations kept in history
    pub max_history: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

fn invalid_value(field: &str, value: impl std::fmt::Display, reason: &str) -> MigrationError {
    MigrationError::Configuration(format!("invalid value '{value}' for {field}: {reason}"))
}

impl MigrationConfig {
    /// Validate configuration for consistency
    pub fn validate(&self) -> MigrationResult<()> {
        if self.checkpoints.max_checkpoints == 0 {
            return Err(invalid_value(
                "checkpoints.max_checkpoints",
                0,
                "at least one checkpoint must be retained",
            ));
        }

        if self.progress.max_history == 0 {
            return Err(invalid_value(
                "progress.max_history",
                0,
                "history size must be greater than 0",
            ));
        }

        if let Some(backoff) = &self.recovery.backoff {
            if !backoff.multiplier.is_finite() || backoff.multiplier < 1.0 {
                return Err(invalid_value(
                    "recovery.backoff.multiplier",
                    backoff.multiplier,
                    "multiplier must be at least 1.0",
                ));
            }

            if backoff.base_delay_ms > backoff.max_delay_ms {
                return Err(invalid_value(
                    "recovery.backoff.base_delay_ms",
                    backoff.base_delay_ms,
                    "base delay must not exceed max_delay_ms",
                ));
            }
        }

        Ok(())
    }
}
