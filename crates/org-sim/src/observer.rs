//! Scheduler observer trait for progress reporting and data collection.

use tracing::{debug, info};

use org_behavior::Intent;
use org_core::SimTime;

use crate::StatsSnapshot;

/// Callbacks invoked by [`Scheduler::run_ticks`][crate::Scheduler::run_ticks].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: dataset writer
///
/// ```rust,ignore
/// struct Collect(Vec<Intent>);
///
/// impl SimObserver for Collect {
///     fn on_intent(&mut self, intent: &Intent) {
///         self.0.push(intent.clone());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the start of each tick, before any agent is considered.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// Called once for every emitted intent, in ascending agent order.
    fn on_intent(&mut self, _intent: &Intent) {}

    /// Called at the end of each tick with the number of emitted intents.
    fn on_tick_end(&mut self, _now: SimTime, _emitted: usize) {}

    /// Called once by [`Scheduler::finish`][crate::Scheduler::finish].
    fn on_shutdown(&mut self, _stats: &StatsSnapshot) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Writes `tracing` events: a debug line per intent and an info line every
/// `every` ticks.
pub struct LogObserver {
    every: u64,
    ticks: u64,
}

impl LogObserver {
    /// `every` of 0 is treated as 1.
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1), ticks: 0 }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(12)
    }
}

impl SimObserver for LogObserver {
    fn on_intent(&mut self, intent: &Intent) {
        debug!(
            actor   = %intent.actor,
            action  = %intent.action,
            target  = %intent.target,
            anomaly = intent.is_anomaly,
            "intent emitted"
        );
    }

    fn on_tick_end(&mut self, now: SimTime, emitted: usize) {
        self.ticks += 1;
        if self.ticks.is_multiple_of(self.every) {
            info!(sim_time = %now, emitted, tick = self.ticks, "tick complete");
        }
    }

    fn on_shutdown(&mut self, stats: &StatsSnapshot) {
        info!(
            total_intents = stats.total_intents,
            anomalous     = stats.anomalous_intents,
            active_agents = stats.active_agents,
            "scheduler shut down"
        );
    }
}
