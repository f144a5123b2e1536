//! # Recovery Metrics
//!
//! Lock-free counters kept by the recovery orchestrator, exposed as a plain
//! snapshot for presentation layers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of orchestrator activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryMetrics {
    /// `execute_with_recovery` invocations
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    /// Operation invocations across all calls
    pub total_attempts: u64,
    pub retries: u64,
}

impl RecoveryMetrics {
    pub fn success_rate(&self) -> f64 {
        let finished = self.successful_calls + self.failed_calls;
        if finished == 0 {
            0.0
        } else {
            self.successful_calls as f64 / finished as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MetricsCounters {
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,
    total_attempts: AtomicU64,
    retries: AtomicU64,
}

impl MetricsCounters {
    pub(crate) fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_attempt(&self) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.successful_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RecoveryMetrics {
        RecoveryMetrics {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            total_attempts: self.total_attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let counters = MetricsCounters::default();
        counters.record_call();
        counters.record_attempt();
        counters.record_retry();
        counters.record_attempt();
        counters.record_success();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total_calls, 1);
        assert_eq!(snapshot.total_attempts, 2);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.success_rate(), 1.0);
    }

    #[test]
    fn test_success_rate_without_calls() {
        assert_eq!(RecoveryMetrics::default().success_rate(), 0.0);
    }
}
