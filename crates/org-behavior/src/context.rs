//! Read-only inputs passed to every `step` call.

use org_agent::RoleCatalog;
use org_core::SimTime;

use crate::TransitionTable;

/// A read-only snapshot of everything an agent may look at while deciding.
///
/// Built by the scheduler (or the agent's worker) once per decision.  All
/// borrows are of start-up configuration that never changes during a run.
pub struct StepContext<'a> {
    /// Simulated time of the decision.
    pub sim_time: SimTime,

    /// Hour-indexed activity intensity in [0, 1].
    pub activity_intensity: f64,

    /// Whether `sim_time` falls inside the agent's declared shift.
    pub in_work_hours: bool,

    pub catalog:     &'a RoleCatalog,
    pub transitions: &'a TransitionTable,
}

impl<'a> StepContext<'a> {
    #[inline]
    pub fn new(
        sim_time:           SimTime,
        activity_intensity: f64,
        in_work_hours:      bool,
        catalog:            &'a RoleCatalog,
        transitions:        &'a TransitionTable,
    ) -> Self {
        Self { sim_time, activity_intensity, in_work_hours, catalog, transitions }
    }
}
