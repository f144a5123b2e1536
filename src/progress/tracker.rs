//! # Progress Tracker
//!
//! Tracks named operations and aggregates their completion into a single
//! weighted figure. Finished operations stay counted until the tracker is
//! disposed, and are also recorded in a bounded history.

use super::types::{GlobalProgress, HistoryEntry, Operation, OperationOptions, OperationStatus};
use crate::config::ProgressConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::logging::log_operation_event;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[derive(Debug, Default)]
struct TrackerState {
    operations: HashMap<String, Operation>,
    history: VecDeque<HistoryEntry>,
    disposed: bool,
}

/// Shared progress registry; wrap in an `Arc` to share between callers
#[derive(Debug)]
pub struct ProgressTracker {
    max_history: usize,
    state: RwLock<TrackerState>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

impl ProgressTracker {
    /// Tracker keeping the last `max_history` finished operations
    ///
    /// A bound of 0 is raised to 1 so the most recent entry is always kept;
    /// `MigrationConfig::validate` rejects 0 for configured trackers.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            state: RwLock::new(TrackerState::default()),
        }
    }

    pub fn from_config(config: &ProgressConfig) -> Self {
        Self::new(config.max_history)
    }

    /// Start (or restart) an operation with zero progress
    pub fn start_operation(
        &self,
        id: impl Into<String>,
        options: OperationOptions,
    ) -> MigrationResult<Operation> {
        let id = id.into();
        if !options.weight.is_finite() || options.weight <= 0.0 {
            return Err(MigrationError::InvalidWeight {
                id,
                weight: options.weight,
            });
        }

        let operation = Operation {
            id: id.clone(),
            name: options.name,
            weight: options.weight,
            progress: 0.0,
            message: None,
            status: OperationStatus::Running,
            total_steps: options.total_steps,
            completed_steps: 0,
            started_at: Utc::now(),
            completed_at: None,
        };

        let mut state = self.state.write();
        if state.disposed {
            return Err(MigrationError::TrackerDisposed);
        }
        if state.operations.insert(id.clone(), operation.clone()).is_some() {
            debug!(operation_id = %id, "Replacing existing operation");
        }
        drop(state);

        log_operation_event(&id, &operation.name, "running", None);
        Ok(operation)
    }

    /// Set the progress of a running operation, clamped to [0, 1]
    pub fn update_progress(
        &self,
        id: &str,
        progress: f64,
        message: Option<&str>,
    ) -> MigrationResult<()> {
        let mut state = self.state.write();
        let operation = Self::operation_mut(&mut state, id)?;
        operation.progress = clamp_progress(progress);
        if let Some(message) = message {
            operation.message = Some(message.to_string());
        }
        debug!(operation_id = %id, progress = operation.progress, "Progress updated");
        Ok(())
    }

    /// Count one more finished step for an operation started with `total_steps`
    ///
    /// Operations without a step count only get their message updated.
    pub fn advance_step(&self, id: &str, message: Option<&str>) -> MigrationResult<Operation> {
        let mut state = self.state.write();
        let operation = Self::operation_mut(&mut state, id)?;
        if let Some(total) = operation.total_steps {
            operation.completed_steps = operation.completed_steps.saturating_add(1).min(total);
            operation.progress = if total == 0 {
                1.0
            } else {
                clamp_progress(f64::from(operation.completed_steps) / f64::from(total))
            };
        }
        if let Some(message) = message {
            operation.message = Some(message.to_string());
        }
        Ok(operation.clone())
    }

    pub fn get_operation_progress(&self, id: &str) -> MigrationResult<Operation> {
        let state = self.state.read();
        if state.disposed {
            return Err(MigrationError::TrackerDisposed);
        }
        state
            .operations
            .get(id)
            .cloned()
            .ok_or_else(|| MigrationError::OperationNotFound { id: id.to_string() })
    }

    /// Mark an operation completed; progress becomes 1.0
    pub fn complete_operation(
        &self,
        id: &str,
        result: Option<serde_json::Value>,
    ) -> MigrationResult<HistoryEntry> {
        self.finish(id, OperationStatus::Completed, result, None)
    }

    /// Mark an operation failed; progress is left where it was
    pub fn fail_operation(&self, id: &str, error: Option<&str>) -> MigrationResult<HistoryEntry> {
        self.finish(id, OperationStatus::Failed, None, error.map(str::to_string))
    }

    fn finish(
        &self,
        id: &str,
        status: OperationStatus,
        result: Option<serde_json::Value>,
        error: Option<String>,
    ) -> MigrationResult<HistoryEntry> {
        let mut state = self.state.write();
        let now = Utc::now();
        let operation = Self::operation_mut(&mut state, id)?;
        operation.status = status;
        operation.completed_at = Some(now);
        if status == OperationStatus::Completed {
            operation.progress = 1.0;
        }

        let entry = HistoryEntry {
            id: operation.id.clone(),
            name: operation.name.clone(),
            status,
            started_at: operation.started_at,
            completed_at: now,
            result,
            error,
        };

        state.history.push_back(entry.clone());
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }
        drop(state);

        log_operation_event(
            &entry.id,
            &entry.name,
            &status.to_string(),
            entry.error.as_deref(),
        );
        Ok(entry)
    }

    /// Weighted completion over every retained operation
    pub fn get_global_progress(&self) -> MigrationResult<GlobalProgress> {
        let state = self.state.read();
        if state.disposed {
            return Err(MigrationError::TrackerDisposed);
        }

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut progress = GlobalProgress {
            overall_progress: 0.0,
            active_operations: 0,
            completed_operations: 0,
            failed_operations: 0,
            total_operations: state.operations.len(),
        };

        for operation in state.operations.values() {
            weighted += operation.weight * operation.progress;
            total_weight += operation.weight;
            match operation.status {
                OperationStatus::Running => progress.active_operations += 1,
                OperationStatus::Completed => progress.completed_operations += 1,
                OperationStatus::Failed => progress.failed_operations += 1,
            }
        }

        if total_weight > 0.0 {
            progress.overall_progress = clamp_progress(weighted / total_weight);
        }
        Ok(progress)
    }

    /// Finished operations, oldest first
    pub fn get_history(&self) -> MigrationResult<Vec<HistoryEntry>> {
        let state = self.state.read();
        if state.disposed {
            return Err(MigrationError::TrackerDisposed);
        }
        Ok(state.history.iter().cloned().collect())
    }

    /// Drop all operations and history; later calls fail with `TrackerDisposed`
    pub fn dispose(&self) {
        let mut state = self.state.write();
        state.operations.clear();
        state.history.clear();
        state.disposed = true;
        debug!("Progress tracker disposed");
    }

    fn operation_mut<'a>(
        state: &'a mut TrackerState,
        id: &str,
    ) -> MigrationResult<&'a mut Operation> {
        if state.disposed {
            return Err(MigrationError::TrackerDisposed);
        }
        state
            .operations
            .get_mut(id)
            .ok_or_else(|| MigrationError::OperationNotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(10)
    }

    #[test]
    fn test_start_operation_defaults() {
        let tracker = tracker();
        let operation = tracker
            .start_operation("op-1", OperationOptions::new("create_tables"))
            .unwrap();

        assert_eq!(operation.weight, 1.0);
        assert_eq!(operation.progress, 0.0);
        assert_eq!(operation.status, OperationStatus::Running);
        assert!(operation.completed_at.is_none());
    }

    #[test]
    fn test_restart_replaces_operation() {
        let tracker = tracker();
        tracker
            .start_operation("op-1", OperationOptions::new("first"))
            .unwrap();
        tracker.update_progress("op-1", 0.7, None).unwrap();
        tracker
            .start_operation("op-1", OperationOptions::new("second"))
            .unwrap();

        let operation = tracker.get_operation_progress("op-1").unwrap();
        assert_eq!(operation.name, "second");
        assert_eq!(operation.progress, 0.0);
        assert_eq!(tracker.get_global_progress().unwrap().total_operations, 1);
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let tracker = tracker();
        for weight in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result =
                tracker.start_operation("op", OperationOptions::new("bad").with_weight(weight));
            assert!(matches!(result, Err(MigrationError::InvalidWeight { .. })));
        }
    }

    #[test]
    fn test_update_progress_clamps_and_sets_message() {
        let tracker = tracker();
        tracker
            .start_operation("op-1", OperationOptions::new("alter"))
            .unwrap();

        tracker
            .update_progress("op-1", 1.5, Some("almost there"))
            .unwrap();
        let operation = tracker.get_operation_progress("op-1").unwrap();
        assert_eq!(operation.progress, 1.0);
        assert_eq!(operation.message.as_deref(), Some("almost there"));

        tracker.update_progress("op-1", -0.3, None).unwrap();
        let operation = tracker.get_operation_progress("op-1").unwrap();
        assert_eq!(operation.progress, 0.0);
        assert_eq!(operation.message.as_deref(), Some("almost there"));
    }

    #[test]
    fn test_unknown_operation_errors() {
        let tracker = tracker();
        assert_eq!(
            tracker.get_operation_progress("missing"),
            Err(MigrationError::OperationNotFound {
                id: "missing".to_string()
            })
        );
        assert!(matches!(
            tracker.update_progress("missing", 0.5, None),
            Err(MigrationError::OperationNotFound { .. })
        ));
        assert!(tracker.complete_operation("missing", None).is_err());
        assert!(tracker.fail_operation("missing", None).is_err());
    }

    #[test]
    fn test_weighted_global_progress() {
        let tracker = tracker();
        tracker
            .start_operation("a", OperationOptions::new("a").with_weight(1.0))
            .unwrap();
        tracker
            .start_operation("b", OperationOptions::new("b").with_weight(2.0))
            .unwrap();
        tracker.complete_operation("a", None).unwrap();
        tracker.update_progress("b", 0.5, None).unwrap();

        let global = tracker.get_global_progress().unwrap();
        assert!((global.overall_progress - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(global.active_operations, 1);
        assert_eq!(global.completed_operations, 1);
        assert_eq!(global.total_operations, 2);
    }

    #[test]
    fn test_empty_tracker_reports_zero() {
        let global = tracker().get_global_progress().unwrap();
        assert_eq!(global.overall_progress, 0.0);
        assert_eq!(global.total_operations, 0);
    }

    #[test]
    fn test_fail_keeps_progress() {
        let tracker = tracker();
        tracker
            .start_operation("op", OperationOptions::new("drop_column"))
            .unwrap();
        tracker.update_progress("op", 0.4, None).unwrap();
        let entry = tracker
            .fail_operation("op", Some("deadlock detected"))
            .unwrap();

        assert_eq!(entry.status, OperationStatus::Failed);
        assert_eq!(entry.error.as_deref(), Some("deadlock detected"));
        let operation = tracker.get_operation_progress("op").unwrap();
        assert_eq!(operation.progress, 0.4);
        assert!(operation.completed_at.is_some());
        assert_eq!(tracker.get_global_progress().unwrap().failed_operations, 1);
    }

    #[test]
    fn test_history_after_completion() {
        let tracker = tracker();
        tracker
            .start_operation("op", OperationOptions::new("create_index"))
            .unwrap();
        tracker
            .complete_operation("op", Some(serde_json::json!({"rows": 12})))
            .unwrap();

        let history = tracker.get_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, OperationStatus::Completed);
        assert_eq!(history[0].result, Some(serde_json::json!({"rows": 12})));
        assert!(history[0].duration() >= chrono::Duration::zero());
    }

    #[test]
    fn test_history_is_bounded() {
        let tracker = ProgressTracker::new(3);
        for i in 0..5 {
            let id = format!("op-{i}");
            tracker
                .start_operation(id.as_str(), OperationOptions::new("step"))
                .unwrap();
            tracker.complete_operation(&id, None).unwrap();
        }

        let ids: Vec<_> = tracker
            .get_history()
            .unwrap()
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["op-2", "op-3", "op-4"]);
        // Finished operations remain counted in aggregates
        assert_eq!(tracker.get_global_progress().unwrap().completed_operations, 5);
    }

    #[test]
    fn test_zero_history_bound_keeps_latest_entry() {
        let tracker = ProgressTracker::new(0);
        for id in ["first", "second"] {
            tracker
                .start_operation(id, OperationOptions::new(id))
                .unwrap();
            tracker.complete_operation(id, None).unwrap();
        }

        let history = tracker.get_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "second");
    }

    #[test]
    fn test_advance_step() {
        let tracker = tracker();
        tracker
            .start_operation("op", OperationOptions::new("backfill").with_total_steps(4))
            .unwrap();

        tracker.advance_step("op", Some("batch 1")).unwrap();
        let operation = tracker.advance_step("op", None).unwrap();
        assert_eq!(operation.completed_steps, 2);
        assert_eq!(operation.progress, 0.5);
        assert_eq!(operation.message.as_deref(), Some("batch 1"));

        for _ in 0..5 {
            tracker.advance_step("op", None).unwrap();
        }
        let operation = tracker.get_operation_progress("op").unwrap();
        assert_eq!(operation.completed_steps, 4);
        assert_eq!(operation.progress, 1.0);
    }

    #[test]
    fn test_dispose_makes_tracker_unusable() {
        let tracker = tracker();
        tracker
            .start_operation("op", OperationOptions::new("x"))
            .unwrap();
        tracker.dispose();

        assert_eq!(
            tracker.get_global_progress(),
            Err(MigrationError::TrackerDisposed)
        );
        assert_eq!(tracker.get_history(), Err(MigrationError::TrackerDisposed));
        assert_eq!(
            tracker.get_operation_progress("op"),
            Err(MigrationError::TrackerDisposed)
        );
        assert!(tracker
            .start_operation("op", OperationOptions::new("x"))
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_progress_always_within_bounds(progress in proptest::num::f64::ANY) {
            let tracker = tracker();
            tracker.start_operation("op", OperationOptions::new("p")).unwrap();
            tracker.update_progress("op", progress, None).unwrap();
            let stored = tracker.get_operation_progress("op").unwrap().progress;
            prop_assert!((0.0..=1.0).contains(&stored));
        }

        #[test]
        fn prop_global_progress_within_bounds(
            entries in proptest::collection::vec((0.01f64..100.0, -1.0f64..2.0), 1..20)
        ) {
            let tracker = tracker();
            for (i, (weight, progress)) in entries.iter().enumerate() {
                let id = format!("op-{i}");
                tracker
                    .start_operation(id.as_str(), OperationOptions::new("p").with_weight(*weight))
                    .unwrap();
                tracker.update_progress(&id, *progress, None).unwrap();
            }
            let global = tracker.get_global_progress().unwrap();
            prop_assert!((0.0..=1.0).contains(&global.overall_progress));
            prop_assert_eq!(global.active_operations, entries.len());
        }
    }
}
