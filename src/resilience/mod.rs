//! # Resilience Module
//!
//! Retry and recovery for migration steps that may fail part-way.
//!
//! ## Architecture
//!
//! - **Error Classification**: ordered message rules decide whether a failure is retryable
//! - **Retry Policies**: fixed delay by default, exponential backoff when configured
//! - **Recovery Context**: per-attempt capability to write checkpoints and read caller state
//! - **Orchestrator**: the retry loop, returning the operation's own error once it gives up
//!
//! ## Usage
//!
//! ```rust,no_run
//! use migration_core::checkpoint::CheckpointStore;
//! use migration_core::resilience::RecoveryOrchestrator;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let store = Arc::new(CheckpointStore::new(100));
//! let orchestrator = RecoveryOrchestrator::new(3, Duration::from_millis(500))
//!     .with_checkpoint_store(Arc::clone(&store));
//!
//! let applied = orchestrator
//!     .execute("add_users_email", |ctx| async move {
//!         ctx.create_checkpoint("before_alter", &serde_json::json!({"table": "users"}))?;
//!         // apply generated DDL here
//!         Ok::<_, anyhow::Error>(1)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error_classifier;
pub mod metrics;
pub mod orchestrator;
pub mod retry_policy;

pub use context::RecoveryContext;
pub use error_classifier::{ErrorCategorizer, ErrorCategory, ErrorRule, ErrorType};
pub use metrics::RecoveryMetrics;
pub use orchestrator::RecoveryOrchestrator;
pub use retry_policy::{
    policy_from_config, ExponentialBackoff, FixedDelay, RetryDecision, RetryPolicy,
};
