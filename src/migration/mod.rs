//! # Migration Module
//!
//! Runs migration steps with progress tracking and recovery wired together.
//! The DDL each step applies comes from outside this crate; a step only needs
//! to implement [`MigrationStep`].

pub mod runner;
pub mod step;

pub use runner::{FailedStep, MigrationRunner, PlanReport, StepOutcome};
pub use step::{MigrationStep, StepPosition};
