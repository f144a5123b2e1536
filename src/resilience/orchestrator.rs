//! # Recovery Orchestrator
//!
//! Runs a user operation with categorized-error retry.
//!
//! Each attempt moves through `PENDING → RUNNING → SUCCEEDED | FAILED`. A
//! failure is categorized and turned into a [`RetryDecision`]: retry after the
//! policy's delay, or abort and return the original error untouched.
//!
//! Attempts never overlap within one call. Separate calls may run concurrently
//! against the same orchestrator and share its checkpoint store.

use super::context::RecoveryContext;
use super::error_classifier::{ErrorCategorizer, ErrorCategory};
use super::metrics::{MetricsCounters, RecoveryMetrics};
use super::retry_policy::{policy_from_config, FixedDelay, RetryDecision, RetryPolicy};
use crate::checkpoint::CheckpointStore;
use crate::config::RecoveryConfig;
use crate::logging::log_retry_event;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct RecoveryOrchestrator {
    max_retries: u32,
    retry_policy: Arc<dyn RetryPolicy>,
    error_categorizer: ErrorCategorizer,
    checkpoint_store: RwLock<Option<Arc<CheckpointStore>>>,
    metrics: MetricsCounters,
}

impl fmt::Debug for RecoveryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryOrchestrator")
            .field("max_retries", &self.max_retries)
            .field("retry_policy", &self.retry_policy.policy_name())
            .field("has_checkpoint_store", &self.checkpoint_store.read().is_some())
            .finish()
    }
}

impl Default for RecoveryOrchestrator {
    fn default() -> Self {
        Self::from_config(&RecoveryConfig::default())
    }
}

impl RecoveryOrchestrator {
    /// Fixed-delay orchestrator; `max_retries` counts attempts after the first
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self::with_policy(max_retries, Arc::new(FixedDelay::new(retry_delay)))
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::with_policy(config.max_retries, policy_from_config(config))
    }

    fn with_policy(max_retries: u32, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        info!(
            max_retries,
            retry_policy = retry_policy.policy_name(),
            "🛡️ Recovery orchestrator initialized"
        );

        Self {
            max_retries,
            retry_policy,
            error_categorizer: ErrorCategorizer::new(),
            checkpoint_store: RwLock::new(None),
            metrics: MetricsCounters::default(),
        }
    }

    /// Attach a shared store; the orchestrator never disposes it
    pub fn with_checkpoint_store(self, store: Arc<CheckpointStore>) -> Self {
        *self.checkpoint_store.write() = Some(store);
        self
    }

    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Arc::new(policy);
        self
    }

    pub fn with_error_categorizer(mut self, categorizer: ErrorCategorizer) -> Self {
        self.error_categorizer = categorizer;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn error_categorizer(&self) -> &ErrorCategorizer {
        &self.error_categorizer
    }

    pub fn checkpoint_store(&self) -> Option<Arc<CheckpointStore>> {
        self.checkpoint_store.read().clone()
    }

    pub fn metrics(&self) -> RecoveryMetrics {
        self.metrics.snapshot()
    }

    /// Decide the next transition after `attempt` failed with `category`
    pub fn decide(&self, category: ErrorCategory, attempt: u32) -> RetryDecision {
        if !category.retryable || attempt > self.max_retries {
            RetryDecision::Abort
        } else {
            RetryDecision::Retry {
                delay: self.retry_policy.delay_for(attempt),
            }
        }
    }

    /// [`execute_with_recovery`](Self::execute_with_recovery) without extra context
    pub async fn execute<T, E, F, Fut>(&self, name: &str, operation: F) -> Result<T, E>
    where
        F: FnMut(RecoveryContext<()>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.execute_with_recovery(name, operation, ()).await
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// exhausts `max_retries`
    ///
    /// The error returned is always the operation's own error from the last
    /// attempt.
    pub async fn execute_with_recovery<C, T, E, F, Fut>(
        &self,
        name: &str,
        mut operation: F,
        extra: C,
    ) -> Result<T, E>
    where
        C: Clone,
        F: FnMut(RecoveryContext<C>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.metrics.record_call();
        let started = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            let context =
                RecoveryContext::new(name, attempt, self.checkpoint_store(), extra.clone());
            self.metrics.record_attempt();
            debug!(operation_name = %name, attempt, "▶️ Running attempt");

            let error = match operation(context).await {
                Ok(value) => {
                    self.metrics.record_success();
                    info!(
                        operation_name = %name,
                        attempts = attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "🟢 Operation succeeded"
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            let category = self.error_categorizer.categorize(&error);
            match self.decide(category, attempt) {
                RetryDecision::Retry { delay } => {
                    self.metrics.record_retry();
                    log_retry_event(
                        name,
                        attempt,
                        &category.error_type.to_string(),
                        delay.as_millis() as u64,
                        &error.to_string(),
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Abort => {
                    self.metrics.record_failure();
                    error!(
                        operation_name = %name,
                        attempts = attempt,
                        category = %category.error_type,
                        retryable = category.retryable,
                        error = %error,
                        "🔴 Operation failed, not retrying"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Drop the reference to the shared checkpoint store
    pub fn dispose(&self) {
        self.checkpoint_store.write().take();
        debug!("Recovery orchestrator disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::resilience::error_classifier::ErrorType;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct StepFailure(String);

    fn orchestrator(max_retries: u32) -> RecoveryOrchestrator {
        RecoveryOrchestrator::new(max_retries, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = orchestrator(3)
            .execute("create_table", |_ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, StepFailure>("done") }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let calls = AtomicU32::new(0);
        let orchestrator = orchestrator(2);
        let result = orchestrator
            .execute("add_column", |ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if ctx.attempt() == 1 {
                        Err(StepFailure("connection reset".to_string()))
                    } else {
                        Ok(ctx.attempt())
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let metrics = orchestrator.metrics();
        assert_eq!(metrics.total_attempts, 2);
        assert_eq!(metrics.retries, 1);
        assert_eq!(metrics.successful_calls, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_original_error() {
        for max_retries in [0u32, 1, 3] {
            let calls = AtomicU32::new(0);
            let orchestrator = orchestrator(max_retries);
            let result: Result<(), _> = orchestrator
                .execute("drop_index", |_ctx| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(StepFailure("Network unreachable".to_string())) }
                })
                .await;

            assert_eq!(result, Err(StepFailure("Network unreachable".to_string())));
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
            assert_eq!(orchestrator.metrics().failed_calls, 1);
        }
    }

    #[tokio::test]
    async fn test_non_retryable_aborts_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = orchestrator(5)
            .execute("validate_schema", |_ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(StepFailure("Invalid input format".to_string())) }
            })
            .await;

        assert_eq!(result.unwrap_err().0, "Invalid input format");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = orchestrator(5)
            .execute("apply_rls", |_ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(StepFailure("permission denied for schema public".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_checkpoints_survive_failed_attempts() {
        let store = Arc::new(CheckpointStore::new(10));
        let orchestrator = orchestrator(1).with_checkpoint_store(Arc::clone(&store));

        let result: Result<(), anyhow::Error> = orchestrator
            .execute("backfill", |ctx| async move {
                let state = serde_json::json!({"attempt": ctx.attempt()});
                ctx.create_checkpoint("backfill", &state)?;
                Err::<(), _>(anyhow::anyhow!("database is shutting down"))
            })
            .await;

        assert!(result.is_err());
        let checkpoints = store.list();
        assert_eq!(checkpoints.len(), 2);
        let last = store.restore_checkpoint(&checkpoints[1].id).unwrap();
        assert_eq!(last.state, serde_json::json!({"attempt": 2}));
    }

    #[tokio::test]
    async fn test_extra_context_is_fresh_each_attempt() {
        #[derive(Clone)]
        struct Accessors {
            version: u32,
        }

        let seen = parking_lot::Mutex::new(Vec::new());
        let result = orchestrator(2)
            .execute_with_recovery(
                "rename_table",
                |ctx| {
                    seen.lock().push((ctx.attempt(), ctx.version));
                    async move {
                        if ctx.attempt() < 3 {
                            Err(StepFailure("deadlock detected".to_string()))
                        } else {
                            Ok(())
                        }
                    }
                },
                Accessors { version: 7 },
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(*seen.lock(), vec![(1, 7), (2, 7), (3, 7)]);
    }

    #[tokio::test]
    async fn test_dispose_detaches_store_without_clearing_it() {
        let store = Arc::new(CheckpointStore::new(10));
        store.create_checkpoint("seed", &1).unwrap();
        let orchestrator = orchestrator(0).with_checkpoint_store(Arc::clone(&store));

        orchestrator.dispose();
        assert!(orchestrator.checkpoint_store().is_none());
        assert_eq!(store.len(), 1);

        let result = orchestrator
            .execute("after_dispose", |ctx| async move { ctx.create_checkpoint("x", &1) })
            .await;
        assert_eq!(result, Err(MigrationError::CheckpointStoreUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_suspends_without_blocking_other_tasks() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let orchestrator = RecoveryOrchestrator::new(2, Duration::from_millis(100));
        let seen = parking_lot::Mutex::new(Vec::new());
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = orchestrator
            .execute("create_index", |_ctx| {
                seen.lock().push(ticks.load(Ordering::SeqCst));
                async { Err(StepFailure("connection reset".to_string())) }
            })
            .await;
        let elapsed = started.elapsed();
        ticker.abort();

        assert!(result.is_err());
        assert_eq!(orchestrator.metrics().retries, 2);
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(210));

        // The ticker kept running while each attempt waited out its delay
        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert!(seen[1] > seen[0]);
        assert!(seen[2] > seen[1]);
    }

    #[test]
    fn test_decide() {
        let orchestrator = orchestrator(2);
        let network = orchestrator.error_categorizer().categorize("Connection timeout");
        assert_eq!(network.error_type, ErrorType::Network);

        assert_eq!(
            orchestrator.decide(network, 1),
            RetryDecision::Retry {
                delay: Duration::from_millis(1)
            }
        );
        assert!(matches!(orchestrator.decide(network, 2), RetryDecision::Retry { .. }));
        assert_eq!(orchestrator.decide(network, 3), RetryDecision::Abort);
        assert_eq!(orchestrator.decide(ErrorCategory::UNKNOWN, 1), RetryDecision::Abort);
    }
}
