//! Run-wide counters shared by the scheduler, the workers and the dispatcher.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

use org_behavior::Intent;
use org_feedback::{DatabaseState, DatabaseStateStore};

/// Lock-free counters.  Shared as `Arc<SimStats>`.
#[derive(Debug, Default)]
pub struct SimStats {
    active_agents:     AtomicUsize,
    total_intents:     AtomicU64,
    anomalous_intents: AtomicU64,
    executions:        AtomicU64,
    failed_executions: AtomicU64,
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_intent(&self, intent: &Intent) {
        self.total_intents.fetch_add(1, Ordering::Relaxed);
        if intent.is_anomaly {
            self.anomalous_intents.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_execution(&self, success: bool) {
        self.executions.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_executions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn set_active(&self, count: usize) {
        self.active_agents.store(count, Ordering::Relaxed);
    }

    pub fn agent_activated(&self) {
        self.active_agents.fetch_add(1, Ordering::Relaxed);
    }

    /// Saturates at zero.
    pub fn agent_deactivated(&self) {
        let _ = self
            .active_agents
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn active_agents(&self) -> usize {
        self.active_agents.load(Ordering::Relaxed)
    }

    pub fn total_intents(&self) -> u64 {
        self.total_intents.load(Ordering::Relaxed)
    }

    /// Counters only; `databases` is left empty.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            active_agents:     self.active_agents(),
            total_intents:     self.total_intents(),
            anomalous_intents: self.anomalous_intents.load(Ordering::Relaxed),
            executions:        self.executions.load(Ordering::Relaxed),
            failed_executions: self.failed_executions.load(Ordering::Relaxed),
            backlog:           0,
            databases:         Vec::new(),
        }
    }

    /// Counters plus a summary of every resource in `store`.
    pub fn snapshot_with(&self, store: &DatabaseStateStore) -> StatsSnapshot {
        let mut snap = self.snapshot();
        snap.databases = store.snapshots().iter().map(|s| ResourceSummary::from(s.as_ref())).collect();
        snap
    }
}

/// Point-in-time copy of the counters, for progress reporting.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub active_agents:     usize,
    pub total_intents:     u64,
    pub anomalous_intents: u64,
    pub executions:        u64,
    pub failed_executions: u64,
    /// Feedback queued for the synchronizer but not yet applied.  Zero when
    /// the snapshot was taken without a synchronizer.
    pub backlog:           usize,
    pub databases:         Vec<ResourceSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub resource:       String,
    pub total_queries:  u64,
    pub failed_queries: u64,
    pub slow_queries:   u64,
    pub avg_latency_ms: f64,
    pub violations:     usize,
    pub known_tables:   usize,
}

impl From<&DatabaseState> for ResourceSummary {
    fn from(s: &DatabaseState) -> Self {
        Self {
            resource:       s.resource().to_string(),
            total_queries:  s.total_queries(),
            failed_queries: s.failed_queries(),
            slow_queries:   s.slow_queries(),
            avg_latency_ms: s.avg_latency_ms(),
            violations:     s.violations().len(),
            known_tables:   s.known_tables(),
        }
    }
}
