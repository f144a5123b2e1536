//! # Migration Runner
//!
//! Glue between the progress tracker and the recovery orchestrator: each step
//! is registered as a tracked operation, executed under recovery, and then
//! finalized as completed or failed with its result or error.

use super::step::{MigrationStep, StepPosition};
use crate::checkpoint::{CheckpointId, CheckpointStore};
use crate::config::MigrationConfig;
use crate::error::MigrationResult;
use crate::progress::{GlobalProgress, OperationOptions, ProgressTracker};
use crate::resilience::RecoveryOrchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a single step once recovery has given up or succeeded
#[derive(Debug)]
pub enum StepOutcome {
    Completed(serde_json::Value),
    /// The step's own error from its last attempt
    Failed(anyhow::Error),
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedStep {
    pub name: String,
    pub error: String,
    /// Newest checkpoint labelled with the step name, if any survived
    pub latest_checkpoint: Option<CheckpointId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub completed_steps: Vec<String>,
    pub failed_step: Option<FailedStep>,
    pub global_progress: GlobalProgress,
}

impl PlanReport {
    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct MigrationRunner {
    tracker: Arc<ProgressTracker>,
    orchestrator: Arc<RecoveryOrchestrator>,
}

impl MigrationRunner {
    pub fn new(tracker: Arc<ProgressTracker>, orchestrator: Arc<RecoveryOrchestrator>) -> Self {
        Self {
            tracker,
            orchestrator,
        }
    }

    /// Build tracker, checkpoint store and orchestrator from one configuration
    pub fn from_config(config: &MigrationConfig) -> MigrationResult<Self> {
        config.validate()?;
        let store = Arc::new(CheckpointStore::from_config(&config.checkpoints));
        let orchestrator =
            RecoveryOrchestrator::from_config(&config.recovery).with_checkpoint_store(store);
        Ok(Self::new(
            Arc::new(ProgressTracker::from_config(&config.progress)),
            Arc::new(orchestrator),
        ))
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    pub fn orchestrator(&self) -> &Arc<RecoveryOrchestrator> {
        &self.orchestrator
    }

    pub fn checkpoint_store(&self) -> Option<Arc<CheckpointStore>> {
        self.orchestrator.checkpoint_store()
    }

    /// Track and execute one step
    ///
    /// Errors from the step are reported in the outcome; only tracker failures
    /// surface as `Err`.
    pub async fn run_step(
        &self,
        step: &dyn MigrationStep,
        position: StepPosition,
    ) -> MigrationResult<StepOutcome> {
        let id = step.name().to_string();
        self.tracker.start_operation(
            id.as_str(),
            OperationOptions::new(step.name()).with_weight(step.weight()),
        )?;

        let result = self
            .orchestrator
            .execute_with_recovery(step.name(), |ctx| step.execute(ctx), position)
            .await;

        match result {
            Ok(value) => {
                self.tracker.complete_operation(&id, Some(value.clone()))?;
                Ok(StepOutcome::Completed(value))
            }
            Err(error) => {
                self.tracker.fail_operation(&id, Some(&error.to_string()))?;
                Ok(StepOutcome::Failed(error))
            }
        }
    }

    /// Run steps in order, stopping at the first failure
    pub async fn run_plan(&self, steps: &[Box<dyn MigrationStep>]) -> MigrationResult<PlanReport> {
        let total = steps.len();
        info!(steps = total, "🚀 Starting migration plan");

        let mut completed_steps = Vec::with_capacity(total);
        let mut failed_step = None;

        for (index, step) in steps.iter().enumerate() {
            let position = StepPosition { index, total };
            match self.run_step(step.as_ref(), position).await? {
                StepOutcome::Completed(_) => completed_steps.push(step.name().to_string()),
                StepOutcome::Failed(error) => {
                    let latest_checkpoint = self
                        .checkpoint_store()
                        .and_then(|store| store.latest_for(step.name()));
                    warn!(
                        step = step.name(),
                        index,
                        error = %error,
                        has_checkpoint = latest_checkpoint.is_some(),
                        "Migration plan stopped at failing step"
                    );
                    failed_step = Some(FailedStep {
                        name: step.name().to_string(),
                        error: error.to_string(),
                        latest_checkpoint,
                    });
                    break;
                }
            }
        }

        let report = PlanReport {
            completed_steps,
            failed_step,
            global_progress: self.tracker.get_global_progress()?,
        };
        info!(
            completed = report.completed_steps.len(),
            success = report.is_success(),
            overall_progress = report.global_progress.overall_progress,
            "Migration plan finished"
        );
        Ok(report)
    }
}
