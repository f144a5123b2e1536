//! # Progress Module
//!
//! Observability for migration steps. Callers start an operation before running
//! a step, push progress while it runs, and finalize it as completed or failed.
//! Presentation layers pull snapshots via `get_operation_progress`,
//! `get_global_progress` and `get_history`; the tracker never pushes anywhere.
//!
//! ## Usage
//!
//! ```rust
//! use migration_core::progress::{OperationOptions, ProgressTracker};
//!
//! let tracker = ProgressTracker::new(50);
//! tracker.start_operation("users", OperationOptions::new("create users").with_weight(2.0))?;
//! tracker.update_progress("users", 0.5, Some("columns added"))?;
//! assert_eq!(tracker.get_global_progress()?.active_operations, 1);
//! # Ok::<(), migration_core::MigrationError>(())
//! ```

pub mod tracker;
pub mod types;

pub use tracker::ProgressTracker;
pub use types::{GlobalProgress, HistoryEntry, Operation, OperationOptions, OperationStatus};
