//! Live model of one target database, and the copy-on-read store of them.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use org_core::{AgentId, SimTime};

use crate::{ConstraintKind, ErrorClass, ExecutionFeedback, StatementShape, SyncConfig};

/// One entry of the bounded violation log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViolationRecord {
    pub kind:        ConstraintKind,
    pub table:       Option<String>,
    pub actor:       AgentId,
    pub observed_at: SimTime,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub class:       ErrorClass,
    pub observed_at: SimTime,
}

// ── DatabaseState ─────────────────────────────────────────────────────────────

/// Best-effort health and population estimate of one resource.
///
/// Every collection is bounded by [`SyncConfig`]; the state never grows with
/// the length of the run.
#[derive(Clone, Debug, Serialize)]
pub struct DatabaseState {
    resource:       String,
    entity_counts:  BTreeMap<String, u64>,
    violations:     VecDeque<ViolationRecord>,
    latencies:      VecDeque<f64>,
    slow_queries:   u64,
    total_queries:  u64,
    failed_queries: u64,
    last_updated:   Option<SimTime>,
    last_error:     Option<ErrorRecord>,
}

impl DatabaseState {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource:       resource.into(),
            entity_counts:  BTreeMap::new(),
            violations:     VecDeque::new(),
            latencies:      VecDeque::new(),
            slow_queries:   0,
            total_queries:  0,
            failed_queries: 0,
            last_updated:   None,
            last_error:     None,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn entity_counts(&self) -> &BTreeMap<String, u64> {
        &self.entity_counts
    }

    pub fn entity_count(&self, table: &str) -> Option<u64> {
        self.entity_counts.get(table).copied()
    }

    /// Number of distinct tables seen so far.
    pub fn known_tables(&self) -> usize {
        self.entity_counts.len()
    }

    pub fn violations(&self) -> &VecDeque<ViolationRecord> {
        &self.violations
    }

    /// Latencies inside the rolling window, oldest first.
    pub fn recent_latencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.latencies.iter().copied()
    }

    /// Mean latency over the rolling window (0 when empty).
    pub fn avg_latency_ms(&self) -> f64 {
        if self.latencies.is_empty() {
            0.0
        } else {
            self.latencies.iter().sum::<f64>() / self.latencies.len() as f64
        }
    }

    pub fn slow_queries(&self) -> u64 {
        self.slow_queries
    }

    pub fn total_queries(&self) -> u64 {
        self.total_queries
    }

    pub fn failed_queries(&self) -> u64 {
        self.failed_queries
    }

    /// Fraction of all observed queries that were slow.
    pub fn slow_fraction(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.slow_queries as f64 / self.total_queries as f64
        }
    }

    pub fn last_updated(&self) -> Option<SimTime> {
        self.last_updated
    }

    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.last_error
    }

    /// Preload an entity-count estimate, e.g. from a bootstrap row count.
    pub fn set_entity_count(&mut self, table: impl Into<String>, count: u64) {
        self.entity_counts.insert(table.into(), count);
    }

    /// Fold one feedback record into the state.
    pub fn apply(&mut self, fb: &ExecutionFeedback, config: &SyncConfig) {
        self.total_queries += 1;

        // Latency window.
        let latency = if fb.latency_ms.is_finite() { fb.latency_ms.max(0.0) } else { 0.0 };
        self.latencies.push_back(latency);
        while self.latencies.len() > config.latency_window {
            self.latencies.pop_front();
        }
        if latency > config.slow_threshold_ms {
            self.slow_queries += 1;
        }

        let shape = StatementShape::classify(&fb.query);

        if fb.success {
            self.adjust_entity_counts(&shape, fb.rows);
        } else {
            self.failed_queries += 1;
            if let Some(class) = fb.error {
                let newer = self.last_error.is_none_or(|e| fb.observed_at >= e.observed_at);
                if newer {
                    self.last_error = Some(ErrorRecord { class, observed_at: fb.observed_at });
                }
                if let ErrorClass::Constraint(kind) = class {
                    self.violations.push_back(ViolationRecord {
                        kind,
                        table:       shape.table().map(str::to_string),
                        actor:       fb.actor,
                        observed_at: fb.observed_at,
                    });
                    while self.violations.len() > config.violation_cap {
                        self.violations.pop_front();
                    }
                }
            }
        }

        self.last_updated = Some(match self.last_updated {
            Some(prev) => prev.max(fb.observed_at),
            None => fb.observed_at,
        });
    }

    fn adjust_entity_counts(&mut self, shape: &StatementShape, rows: u64) {
        match shape {
            StatementShape::Insert { table: Some(t) } => {
                *self.entity_counts.entry(t.clone()).or_insert(0) += rows.max(1);
            }
            StatementShape::Delete { table: Some(t) } => {
                let count = self.entity_counts.entry(t.clone()).or_insert(0);
                *count = count.saturating_sub(rows);
            }
            StatementShape::Select { table: Some(t) } | StatementShape::Update { table: Some(t) } => {
                self.entity_counts.entry(t.clone()).or_insert(0);
            }
            _ => {}
        }
    }
}

// ── DatabaseStateStore ────────────────────────────────────────────────────────

/// Shared map of resource → latest `DatabaseState`.
///
/// Readers clone an `Arc` and never hold the lock while looking at the
/// state.  Writers update under the write lock with copy-on-write, so a
/// reader only ever sees a complete state.
#[derive(Clone, Default)]
pub struct DatabaseStateStore {
    inner: Arc<RwLock<HashMap<String, Arc<DatabaseState>>>>,
}

impl DatabaseStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot for `resource`, if any feedback has been seen for it.
    pub fn snapshot(&self, resource: &str) -> Option<Arc<DatabaseState>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(resource).cloned()
    }

    /// Snapshots of every resource, sorted by resource name.
    pub fn snapshots(&self) -> Vec<Arc<DatabaseState>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Arc<DatabaseState>> = map.values().cloned().collect();
        drop(map);
        all.sort_by(|a, b| a.resource.cmp(&b.resource));
        all
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fold `fb` into its resource's state, creating the state on first use.
    ///
    /// Callers must not run two `apply`s concurrently: the synchronizer
    /// worker is the intended single writer.
    pub fn apply(&self, fb: &ExecutionFeedback, config: &SyncConfig) {
        self.update(&fb.resource, |state| state.apply(fb, config));
    }

    /// Preload an entity count for `(resource, table)`.
    pub fn seed_entity_count(&self, resource: &str, table: &str, count: u64) {
        self.update(resource, |state| state.set_entity_count(table, count));
    }

    fn update(&self, resource: &str, f: impl FnOnce(&mut DatabaseState)) {
        // The whole read-modify-write runs under the write lock so a
        // concurrent seed is never overwritten.  Readers holding the previous
        // `Arc` keep it unchanged; `make_mut` copies when they do.
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = map
            .entry(resource.to_string())
            .or_insert_with(|| Arc::new(DatabaseState::new(resource)));
        f(Arc::make_mut(entry));
    }
}
