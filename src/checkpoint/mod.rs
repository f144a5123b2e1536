//! # Checkpoint Module
//!
//! Integrity-verified state snapshots that let a failed migration step be
//! inspected or resumed. Checkpoints written during an attempt are kept even if
//! that attempt fails, so they remain available for post-mortem restores.
//!
//! ## Usage
//!
//! ```rust
//! use migration_core::checkpoint::CheckpointStore;
//! use serde_json::json;
//!
//! let store = CheckpointStore::new(10);
//! let id = store.create_checkpoint("add_email_column", &json!({"table": "users"}))?;
//! let restored = store.restore_checkpoint(&id)?;
//! assert_eq!(restored.state, json!({"table": "users"}));
//! # Ok::<(), migration_core::MigrationError>(())
//! ```

pub mod hash;
pub mod store;

pub use hash::{canonical_value, state_digest};
pub use store::{CheckpointId, CheckpointStore, CheckpointSummary, RestoredCheckpoint};
