//! The path an intent takes after it is emitted.
//!
//! ```text
//! Intent ─▶ ComplexityController::assess ─▶ Translator ─▶ Executor ─▶ SyncHandle::ingest
//! ```
//!
//! The core never looks at query text; the translator and executor are
//! supplied by the embedding application.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use org_behavior::Intent;
use org_complexity::{Assessment, ComplexityController, QueryContext, SuccessWindow};
use org_core::SimClock;
use org_feedback::{DatabaseState, DatabaseStateStore, ExecutionFeedback, SyncHandle};

use crate::{SimStats, StatsSnapshot};

/// Turns an abstract intent into query text within the assessed limits.
pub trait Translator: Send + Sync {
    fn translate(&self, intent: &Intent, assessment: &Assessment) -> String;
}

/// Runs query text against the intent's target resource.
///
/// A failed execution is still feedback (`success == false`), never an error.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, query: &str, intent: &Intent) -> ExecutionFeedback;
}

/// Shared by every worker: assess, translate, execute, publish.
pub struct Dispatcher {
    controller: Arc<ComplexityController>,
    translator: Arc<dyn Translator>,
    executor:   Arc<dyn Executor>,
    sync:       SyncHandle,
    stats:      Arc<SimStats>,
}

impl Dispatcher {
    pub fn new(
        controller: Arc<ComplexityController>,
        translator: Arc<dyn Translator>,
        executor:   Arc<dyn Executor>,
        sync:       SyncHandle,
        stats:      Arc<SimStats>,
    ) -> Self {
        Self { controller, translator, executor, sync, stats }
    }

    pub fn store(&self) -> &DatabaseStateStore {
        self.sync.store()
    }

    pub fn stats(&self) -> &Arc<SimStats> {
        &self.stats
    }

    pub fn sync(&self) -> &SyncHandle {
        &self.sync
    }

    /// Counters, synchronizer backlog and per-resource summaries.
    pub fn live_stats(&self) -> StatsSnapshot {
        let mut snap = self.stats.snapshot_with(self.sync.store());
        snap.backlog = self.sync.backlog();
        snap
    }

    /// Latest state of `resource`, if any feedback has reached it.
    pub fn snapshot(&self, resource: &str) -> Option<Arc<DatabaseState>> {
        self.sync.store().snapshot(resource)
    }

    /// Run one intent through the pipeline and return the execution outcome.
    ///
    /// The feedback's `observed_at` is overwritten with `clock.now()` taken
    /// after the executor returns.  A failed assessment falls back to the
    /// `Simple` strategy; a closed synchronizer drops the feedback.
    pub async fn dispatch<C: SimClock + ?Sized>(
        &self,
        intent:  &Intent,
        ctx:     &QueryContext,
        history: &SuccessWindow,
        clock:   &C,
    ) -> bool {
        let assessment = match self.controller.assess_with_history(ctx, history) {
            Ok(a) => a,
            Err(e) => {
                warn!(actor = %intent.actor, error = %e, "complexity assessment failed, using fallback");
                Assessment::fallback()
            }
        };

        let query = self.translator.translate(intent, &assessment);
        let mut feedback = self.executor.execute(&query, intent).await;
        feedback.observed_at = clock.now();

        let success = feedback.success;
        self.stats.record_execution(success);
        if let Err(e) = self.sync.ingest(feedback) {
            warn!(actor = %intent.actor, error = %e, "feedback dropped");
        }
        success
    }
}
