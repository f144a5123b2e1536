//! Per-attempt recovery context.
//!
//! A fresh `RecoveryContext` is built for every attempt. It can write
//! checkpoints to the orchestrator's store and carries whatever extra value the
//! caller supplied (typically state accessors), reachable through `Deref`.
//! It holds no reference to the orchestrator itself.

use crate::checkpoint::{CheckpointId, CheckpointStore};
use crate::error::{MigrationError, MigrationResult};
use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RecoveryContext<C = ()> {
    operation_name: String,
    attempt: u32,
    checkpoint_store: Option<Arc<CheckpointStore>>,
    extra: C,
}

impl<C> RecoveryContext<C> {
    pub(crate) fn new(
        operation_name: &str,
        attempt: u32,
        checkpoint_store: Option<Arc<CheckpointStore>>,
        extra: C,
    ) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            attempt,
            checkpoint_store,
            extra,
        }
    }

    /// Snapshot `state` in the shared store
    ///
    /// The checkpoint survives even if this attempt later fails.
    pub fn create_checkpoint<S: Serialize + ?Sized>(
        &self,
        label: &str,
        state: &S,
    ) -> MigrationResult<CheckpointId> {
        self.checkpoint_store
            .as_ref()
            .ok_or(MigrationError::CheckpointStoreUnavailable)?
            .create_checkpoint(label, state)
    }

    pub fn has_checkpoint_store(&self) -> bool {
        self.checkpoint_store.is_some()
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// 1-based attempt number
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn extra(&self) -> &C {
        &self.extra
    }
}

impl<C> Deref for RecoveryContext<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.extra
    }
}
