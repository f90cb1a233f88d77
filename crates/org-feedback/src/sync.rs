//! `DatabaseStateSynchronizer`: the background feedback consumer.
//!
//! Producers (agent workers, or the stepped driver) push
//! [`ExecutionFeedback`] into an unbounded channel through a cloneable
//! [`SyncHandle`].  One tokio task drains the channel and is the only writer
//! of the [`DatabaseStateStore`].  The queue depth is tracked in an atomic so
//! a growing backlog is visible without touching the channel.
//!
//! On shutdown the worker stops waiting for new feedback, drains whatever is
//! already queued, and returns a [`SyncReport`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{DatabaseStateStore, ExecutionFeedback, SyncError, SyncResult};

// ── SyncConfig ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Executions slower than this count as slow queries.
    pub slow_threshold_ms: f64,
    /// Length of the rolling latency window.
    pub latency_window:    usize,
    /// Maximum number of retained constraint violations per resource.
    pub violation_cap:     usize,
    /// Queue depth at which a backlog warning is logged.
    pub backlog_warn:      usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: 1_000.0,
            latency_window:    100,
            violation_cap:     50,
            backlog_warn:      10_000,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> SyncResult<()> {
        if !self.slow_threshold_ms.is_finite() || self.slow_threshold_ms <= 0.0 {
            return Err(SyncError::Config(format!(
                "slow_threshold_ms must be finite and > 0, got {}",
                self.slow_threshold_ms
            )));
        }
        if self.latency_window == 0 || self.violation_cap == 0 {
            return Err(SyncError::Config("latency_window and violation_cap must be > 0".into()));
        }
        Ok(())
    }
}

// ── SyncHandle ────────────────────────────────────────────────────────────────

/// Producer side of the synchronizer.  Cheap to clone; safe to use from any
/// number of tasks at once.
#[derive(Clone)]
pub struct SyncHandle {
    tx:           mpsc::UnboundedSender<ExecutionFeedback>,
    depth:        Arc<AtomicUsize>,
    backlog_warn: usize,
    store:        DatabaseStateStore,
}

impl SyncHandle {
    /// Queue one feedback record.
    ///
    /// # Errors
    ///
    /// `SyncError::Closed` once the worker has exited.
    pub fn ingest(&self, feedback: ExecutionFeedback) -> SyncResult<()> {
        let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        if self.tx.send(feedback).is_err() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
            return Err(SyncError::Closed);
        }
        if depth == self.backlog_warn {
            warn!(depth, "feedback backlog reached warning threshold");
        }
        Ok(())
    }

    /// Feedback records queued but not yet applied.
    pub fn backlog(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// The store this synchronizer writes to.
    pub fn store(&self) -> &DatabaseStateStore {
        &self.store
    }
}

/// What the worker did before it stopped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub processed: u64,
}

// ── DatabaseStateSynchronizer ─────────────────────────────────────────────────

pub struct DatabaseStateSynchronizer {
    config: SyncConfig,
    store:  DatabaseStateStore,
    rx:     mpsc::UnboundedReceiver<ExecutionFeedback>,
    depth:  Arc<AtomicUsize>,
}

impl DatabaseStateSynchronizer {
    /// Start the worker on the current tokio runtime.
    ///
    /// The worker exits when `shutdown` carries `true`, when its sender is
    /// dropped, or when every [`SyncHandle`] has been dropped.
    pub fn spawn(
        config:   SyncConfig,
        store:    DatabaseStateStore,
        shutdown: watch::Receiver<bool>,
    ) -> SyncResult<(SyncHandle, JoinHandle<SyncReport>)> {
        config.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));

        let handle = SyncHandle {
            tx,
            depth:        Arc::clone(&depth),
            backlog_warn: config.backlog_warn,
            store:        store.clone(),
        };
        let worker = Self { config, store, rx, depth };
        let join = tokio::spawn(worker.run(shutdown));
        Ok((handle, join))
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SyncReport {
        let mut report = SyncReport::default();
        info!("database state synchronizer started");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                next = self.rx.recv() => match next {
                    Some(fb) => self.process(&fb, &mut report),
                    None => break,
                },
            }
        }

        // Refuse new feedback, then apply whatever is already queued.  A
        // producer racing the close gets `SyncError::Closed` instead of a
        // silently dropped record.
        self.rx.close();
        while let Ok(fb) = self.rx.try_recv() {
            self.process(&fb, &mut report);
        }

        info!(processed = report.processed, "database state synchronizer stopped");
        report
    }

    fn process(&self, fb: &ExecutionFeedback, report: &mut SyncReport) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
        self.store.apply(fb, &self.config);
        report.processed += 1;
        debug!(
            resource = %fb.resource,
            actor    = %fb.actor,
            success  = fb.success,
            latency  = fb.latency_ms,
            "feedback applied",
        );
    }
}
