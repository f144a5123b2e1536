//! # Error Types
//!
//! Errors raised by the resilience core itself. Failures produced by a user
//! operation running under [`RecoveryOrchestrator`](crate::resilience::RecoveryOrchestrator)
//! are never converted into this type; they are handed back to the caller unchanged.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MigrationError {
    /// No tracked operation has the given id
    #[error("Operation not found: {id}")]
    OperationNotFound { id: String },

    /// No stored checkpoint has the given id
    #[error("Checkpoint not found: {id}")]
    CheckpointNotFound { id: String },

    /// String is not a well-formed checkpoint id
    #[error("Invalid checkpoint id: {id}")]
    InvalidCheckpointId { id: String },

    /// Stored digest does not match the digest of the stored state
    #[error("Checkpoint {id}: checkpoint integrity check failed")]
    CheckpointIntegrityError { id: String },

    #[error("Invalid weight {weight} for operation {id}: weight must be a positive finite number")]
    InvalidWeight { id: String, weight: f64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A recovery context was asked to checkpoint without a backing store
    #[error("No checkpoint store is attached to this recovery context")]
    CheckpointStoreUnavailable,

    #[error("Progress tracker has been disposed")]
    TrackerDisposed,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for MigrationError {
    fn from(error: serde_json::Error) -> Self {
        MigrationError::Serialization(format!("JSON serialization error: {error}"))
    }
}

impl From<config::ConfigError> for MigrationError {
    fn from(error: config::ConfigError) -> Self {
        MigrationError::Configuration(error.to_string())
    }
}

pub type MigrationResult<T> = std::result::Result<T, MigrationError>;
