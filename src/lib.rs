#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, DDL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Migration Core Rust
//!
//! Resilient execution core for long-running, multi-step schema migrations.
//!
//! ## Overview
//!
//! Applying generated DDL against a live database can fail half way through:
//! connections drop, locks deadlock, a statement turns out to be invalid. This
//! crate lets each migration step be retried safely, observed while it runs,
//! and inspected after it fails.
//!
//! ## Module Organization
//!
//! - [`progress`] - Weighted progress tracking with bounded history
//! - [`checkpoint`] - Integrity-checked, bounded in-memory checkpoint store
//! - [`resilience`] - Error classification, retry policies and the recovery orchestrator
//! - [`migration`] - Step trait and plan runner wiring the above together
//! - [`config`] - Layered configuration (defaults, TOML, environment)
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured `tracing` setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use migration_core::{CheckpointStore, OperationOptions, ProgressTracker, RecoveryOrchestrator};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let tracker = Arc::new(ProgressTracker::new(100));
//! let store = Arc::new(CheckpointStore::new(100));
//! let orchestrator = RecoveryOrchestrator::new(3, Duration::from_secs(1))
//!     .with_checkpoint_store(Arc::clone(&store));
//!
//! tracker.start_operation("users", OperationOptions::new("create users table"))?;
//! let outcome = orchestrator
//!     .execute("users", |ctx| async move {
//!         ctx.create_checkpoint("users", &serde_json::json!({"stage": "before_create"}))?;
//!         Ok::<_, anyhow::Error>("created")
//!     })
//!     .await;
//!
//! match outcome {
//!     Ok(_) => tracker.complete_operation("users", None)?,
//!     Err(error) => tracker.fail_operation("users", Some(&error.to_string()))?,
//! };
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod logging;
pub mod migration;
pub mod progress;
pub mod resilience;

pub use checkpoint::{CheckpointId, CheckpointStore, CheckpointSummary, RestoredCheckpoint};
pub use config::{
    BackoffConfig, CheckpointConfig, MigrationConfig, ProgressConfig, RecoveryConfig,
};
pub use error::{MigrationError, MigrationResult};
pub use migration::{MigrationRunner, MigrationStep, PlanReport, StepOutcome, StepPosition};
pub use progress::{
    GlobalProgress, HistoryEntry, Operation, OperationOptions, OperationStatus, ProgressTracker,
};
pub use resilience::{
    ErrorCategorizer, ErrorCategory, ErrorType, RecoveryContext, RecoveryMetrics,
    RecoveryOrchestrator, RetryPolicy,
};
