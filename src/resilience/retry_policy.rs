//! Retry delay policies.
//!
//! The orchestrator asks its policy how long to wait before the next attempt.
//! `FixedDelay` is the default; `ExponentialBackoff` is selected when a
//! `[recovery.backoff]` section is configured.

use crate::config::{BackoffConfig, RecoveryConfig};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Computes the pause that follows a failed attempt
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// `attempt` is the 1-based number of the attempt that just failed
    fn delay_for(&self, attempt: u32) -> Duration;

    fn policy_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl RetryPolicy for FixedDelay {
    fn delay_for(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn policy_name(&self) -> &'static str {
        "fixed_delay"
    }
}

/// `base * multiplier^(attempt - 1)`, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            base,
            max,
            multiplier,
        }
    }
}

impl From<&BackoffConfig> for ExponentialBackoff {
    fn from(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.multiplier,
        )
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let millis = self.base.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_millis = self.max.as_millis() as f64;

        if !millis.is_finite() || millis >= max_millis {
            self.max
        } else if millis <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_millis(millis as u64)
        }
    }

    fn policy_name(&self) -> &'static str {
        "exponential_backoff"
    }
}

/// Policy described by a recovery configuration
pub fn policy_from_config(config: &RecoveryConfig) -> Arc<dyn RetryPolicy> {
    match &config.backoff {
        Some(backoff) => Arc::new(ExponentialBackoff::from(backoff)),
        None => Arc::new(FixedDelay::new(config.retry_delay())),
    }
}

/// What happens after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then run the next attempt
    Retry { delay: Duration },
    /// Stop and hand the original failure back to the caller
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = FixedDelay::new(Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(10), Duration::from_millis(250));
        assert_eq!(policy.policy_name(), "fixed_delay");
    }

    #[test]
    fn test_exponential_backoff_growth_and_cap() {
        let policy =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(1), 2.0);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = RecoveryConfig::default();
        assert_eq!(policy_from_config(&config).policy_name(), "fixed_delay");

        config.backoff = Some(BackoffConfig::default());
        let policy = policy_from_config(&config);
        assert_eq!(policy.policy_name(), "exponential_backoff");
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }
}
