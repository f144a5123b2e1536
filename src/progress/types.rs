//! Progress data types returned by [`ProgressTracker`](super::ProgressTracker).
//!
//! Everything here is a plain snapshot; holding one never blocks the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Running,
    Completed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::Running)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Running => write!(f, "running"),
            OperationStatus::Completed => write!(f, "completed"),
            OperationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Options accepted by `start_operation`
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOptions {
    pub name: String,
    /// Share of the global progress; must be positive
    pub weight: f64,
    /// Enables step-based progress via `advance_step`
    pub total_steps: Option<u32>,
}

impl OperationOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1.0,
            total_steps: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_total_steps(mut self, total_steps: u32) -> Self {
        self.total_steps = Some(total_steps);
        self
    }
}

/// A tracked operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub name: String,
    pub weight: f64,
    /// Fraction complete, always within [0, 1]
    pub progress: f64,
    pub message: Option<String>,
    pub status: OperationStatus,
    pub total_steps: Option<u32>,
    pub completed_steps: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregate view over every operation the tracker retains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalProgress {
    /// Weighted mean of per-operation progress
    pub overall_progress: f64,
    pub active_operations: usize,
    pub completed_operations: usize,
    pub failed_operations: usize,
    pub total_operations: usize,
}

/// Record of a finished operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub status: OperationStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }
}
