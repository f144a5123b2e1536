//! # Checkpoint Store
//!
//! In-memory, integrity-checked snapshots of operation state. The digest is
//! computed once at creation over the canonical encoding and verified on every
//! restore; a mismatch is always reported, never repaired.
//!
//! Retention is bounded: once the store holds more than `max_checkpoints`
//! records, the oldest ones (creation order) are evicted.

use super::hash::{canonical_value, state_digest};
use crate::config::CheckpointConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::logging::log_checkpoint_event;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error};
use uuid::Uuid;

/// Opaque, unique checkpoint identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckpointId(Uuid);

impl CheckpointId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CheckpointId {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| MigrationError::InvalidCheckpointId { id: s.to_string() })
    }
}

#[derive(Debug, Clone)]
struct CheckpointRecord {
    operation_name: String,
    state: Value,
    hash: String,
    created_at: DateTime<Utc>,
}

/// Verified state handed back by `restore_checkpoint`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoredCheckpoint {
    pub id: CheckpointId,
    pub operation_name: String,
    pub state: Value,
    pub created_at: DateTime<Utc>,
}

/// Listing entry; carries no state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub id: CheckpointId,
    pub operation_name: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<CheckpointId, CheckpointRecord>,
    /// Creation order, oldest at the front
    order: VecDeque<CheckpointId>,
    last_created_at: Option<DateTime<Utc>>,
}

/// Shared checkpoint registry; wrap in an `Arc` to share between callers
#[derive(Debug)]
pub struct CheckpointStore {
    max_checkpoints: usize,
    state: Mutex<StoreState>,
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::from_config(&CheckpointConfig::default())
    }
}

impl CheckpointStore {
    pub fn new(max_checkpoints: usize) -> Self {
        Self {
            max_checkpoints,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn from_config(config: &CheckpointConfig) -> Self {
        Self::new(config.max_checkpoints)
    }

    pub fn max_checkpoints(&self) -> usize {
        self.max_checkpoints
    }

    /// Snapshot `state` under a fresh id
    ///
    /// The returned id may already have been evicted if the store bound is zero.
    pub fn create_checkpoint<S: Serialize + ?Sized>(
        &self,
        operation_name: &str,
        state: &S,
    ) -> MigrationResult<CheckpointId> {
        let state = canonical_value(state)?;
        let hash = state_digest(&state)?;

        let mut store = self.state.lock();
        // Stamped under the lock so `order` is also `created_at` order
        let created_at = match store.last_created_at {
            Some(last) => Utc::now().max(last),
            None => Utc::now(),
        };
        store.last_created_at = Some(created_at);

        let mut id = CheckpointId::generate();
        while store.records.contains_key(&id) {
            id = CheckpointId::generate();
        }
        let record = CheckpointRecord {
            operation_name: operation_name.to_string(),
            state,
            hash,
            created_at,
        };
        store.records.insert(id, record);
        store.order.push_back(id);

        let mut evicted = Vec::new();
        while store.order.len() > self.max_checkpoints {
            match store.order.pop_front() {
                Some(oldest) => {
                    store.records.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        let retained = store.records.len();
        drop(store);

        log_checkpoint_event("created", &id.to_string(), Some(operation_name));
        for oldest in &evicted {
            debug!(checkpoint_id = %oldest, retained, "Evicted checkpoint");
        }
        Ok(id)
    }

    /// Verify and return a copy of a stored checkpoint
    pub fn restore_checkpoint(&self, id: &CheckpointId) -> MigrationResult<RestoredCheckpoint> {
        let record = self
            .state
            .lock()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| MigrationError::CheckpointNotFound { id: id.to_string() })?;

        let actual = state_digest(&record.state)?;
        if actual != record.hash {
            error!(
                checkpoint_id = %id,
                operation_name = %record.operation_name,
                expected = %record.hash,
                actual = %actual,
                "❌ Checkpoint integrity check failed"
            );
            return Err(MigrationError::CheckpointIntegrityError { id: id.to_string() });
        }

        log_checkpoint_event(
            "restored",
            &id.to_string(),
            Some(record.operation_name.as_str()),
        );
        Ok(RestoredCheckpoint {
            id: *id,
            operation_name: record.operation_name,
            state: record.state,
            created_at: record.created_at,
        })
    }

    /// Restore and deserialize the state into `T`
    pub fn restore_checkpoint_as<T: DeserializeOwned>(
        &self,
        id: &CheckpointId,
    ) -> MigrationResult<T> {
        let restored = self.restore_checkpoint(id)?;
        Ok(serde_json::from_value(restored.state)?)
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &CheckpointId) -> bool {
        self.state.lock().records.contains_key(id)
    }

    /// Retained checkpoints in creation order
    pub fn list(&self) -> Vec<CheckpointSummary> {
        let store = self.state.lock();
        store
            .order
            .iter()
            .filter_map(|id| {
                store.records.get(id).map(|record| CheckpointSummary {
                    id: *id,
                    operation_name: record.operation_name.clone(),
                    hash: record.hash.clone(),
                    created_at: record.created_at,
                })
            })
            .collect()
    }

    /// Most recent retained checkpoint for an operation
    pub fn latest_for(&self, operation_name: &str) -> Option<CheckpointId> {
        let store = self.state.lock();
        store
            .order
            .iter()
            .rev()
            .find(|id| {
                store
                    .records
                    .get(*id)
                    .is_some_and(|record| record.operation_name == operation_name)
            })
            .copied()
    }

    pub fn dispose(&self) {
        let mut store = self.state.lock();
        store.records.clear();
        store.order.clear();
        debug!("Checkpoint store disposed");
    }
}
