//! Migration step abstraction.

use crate::resilience::RecoveryContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a step sits inside its plan; available to the step through its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPosition {
    /// 0-based
    pub index: usize,
    pub total: usize,
}

impl StepPosition {
    pub fn single() -> Self {
        Self { index: 0, total: 1 }
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

/// One unit of migration work, typically applying a batch of generated DDL
///
/// `execute` may run several times; use `ctx.create_checkpoint` before risky
/// sub-steps so a later attempt or a post-mortem can see how far it got.
#[async_trait]
pub trait MigrationStep: Send + Sync {
    fn name(&self) -> &str;

    /// Share of overall plan progress
    fn weight(&self) -> f64 {
        1.0
    }

    async fn execute(
        &self,
        ctx: RecoveryContext<StepPosition>,
    ) -> anyhow::Result<serde_json::Value>;
}
