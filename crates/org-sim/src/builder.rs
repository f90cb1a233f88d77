//! Fluent builder for constructing a [`Scheduler`].

use std::sync::Arc;

use org_agent::{AgentProfile, RoleCatalog};
use org_behavior::{Agent, BenignState, TransitionTable};
use org_complexity::SuccessWindow;
use org_core::{AgentRng, SimClock};
use org_feedback::DatabaseStateStore;
use org_schedule::{ActivityGate, CooldownPolicy, CooldownTable, GatePolicy, HolidayCalendar, IntensityCurve};

use crate::{Scheduler, SimError, SimResult, SimStats};

/// Fluent builder for [`Scheduler<C>`].
///
/// # Required inputs
///
/// - `C: SimClock`, usually a [`org_core::SteppedClock`]
/// - the population's [`AgentProfile`]s and one [`AgentRng`] per agent, from
///   [`org_agent::PopulationBuilder`] or the CSV loader
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                          |
/// |-----------------------|----------------------------------|
/// | `.catalog(c)`         | `RoleCatalog::builtin()`         |
/// | `.transitions(t)`     | `TransitionTable::builtin()`     |
/// | `.gate_policy(p)`     | `GatePolicy::default()`          |
/// | `.curve(c)`           | `IntensityCurve::default()`      |
/// | `.holidays(h)`        | no holidays                      |
/// | `.cooldown_policy(p)` | `CooldownPolicy::default()`      |
/// | `.store(s)`           | none (stats omit databases)      |
/// | `.stats(s)`           | a fresh `SimStats`               |
///
/// # Example
///
/// ```rust,ignore
/// let (profiles, rngs) = PopulationBuilder::new(42).with_role(Role::Sales, 10).build();
/// let mut scheduler = SchedulerBuilder::new(config.make_stepped_clock(), profiles, rngs)
///     .holidays(HolidayCalendar::new().with_fixed_holidays(2024))
///     .build()?;
/// let intents = scheduler.tick(config.tick_minutes);
/// ```
pub struct SchedulerBuilder<C: SimClock> {
    clock:           C,
    profiles:        Vec<AgentProfile>,
    rngs:            Vec<AgentRng>,
    catalog:         Option<Arc<RoleCatalog>>,
    transitions:     Option<Arc<TransitionTable>>,
    gate_policy:     GatePolicy,
    curve:           IntensityCurve,
    holidays:        HolidayCalendar,
    cooldown_policy: CooldownPolicy,
    store:           Option<DatabaseStateStore>,
    stats:           Option<Arc<SimStats>>,
}

impl<C: SimClock> SchedulerBuilder<C> {
    pub fn new(clock: C, profiles: Vec<AgentProfile>, rngs: Vec<AgentRng>) -> Self {
        Self {
            clock,
            profiles,
            rngs,
            catalog:         None,
            transitions:     None,
            gate_policy:     GatePolicy::default(),
            curve:           IntensityCurve::default(),
            holidays:        HolidayCalendar::default(),
            cooldown_policy: CooldownPolicy::default(),
            store:           None,
            stats:           None,
        }
    }

    pub fn catalog(mut self, catalog: Arc<RoleCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn transitions(mut self, transitions: Arc<TransitionTable>) -> Self {
        self.transitions = Some(transitions);
        self
    }

    pub fn gate_policy(mut self, policy: GatePolicy) -> Self {
        self.gate_policy = policy;
        self
    }

    pub fn curve(mut self, curve: IntensityCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn cooldown_policy(mut self, policy: CooldownPolicy) -> Self {
        self.cooldown_policy = policy;
        self
    }

    /// Attach the store whose summaries [`Scheduler::stats`] should include.
    pub fn store(mut self, store: DatabaseStateStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Share counters with other components (e.g. a [`crate::Dispatcher`]).
    pub fn stats(mut self, stats: Arc<SimStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Validate inputs and return a ready-to-tick [`Scheduler`].
    pub fn build(self) -> SimResult<Scheduler<C>> {
        let agent_count = self.profiles.len();

        let catalog = self.catalog.unwrap_or_else(|| Arc::new(RoleCatalog::builtin()));
        let transitions = self.transitions.unwrap_or_else(|| Arc::new(TransitionTable::builtin()));
        validate_population(&self.profiles, self.rngs.len(), &catalog, &transitions)?;

        // ── Validate policies ─────────────────────────────────────────────
        self.gate_policy.validate()?;
        self.cooldown_policy.validate()?;

        let gate = ActivityGate::new(catalog)
            .with_policy(self.gate_policy)
            .with_curve(self.curve)
            .with_holidays(self.holidays);

        // ── Build agents ──────────────────────────────────────────────────
        let mut rngs = self.rngs;
        let agents: Vec<Agent> = self
            .profiles
            .into_iter()
            .zip(rngs.iter_mut())
            .map(|(profile, rng)| Agent::from_profile(profile, rng))
            .collect();
        let windows = vec![SuccessWindow::default(); agent_count];

        Ok(Scheduler {
            clock: self.clock,
            agents,
            rngs,
            windows,
            gate,
            transitions,
            cooldowns: CooldownTable::new(),
            admitted: vec![false; agent_count],
            cooldown_policy: self.cooldown_policy,
            stats: self.stats.unwrap_or_default(),
            store: self.store,
            shut_down: false,
        })
    }
}

/// Checks shared by the stepped scheduler and the worker runtime.
pub(crate) fn validate_population(
    profiles:    &[AgentProfile],
    rng_count:   usize,
    catalog:     &RoleCatalog,
    transitions: &TransitionTable,
) -> SimResult<()> {
    if rng_count != profiles.len() {
        return Err(SimError::AgentCountMismatch {
            expected: profiles.len(),
            got:      rng_count,
            what:     "agent rngs",
        });
    }
    if let Some((i, p)) = profiles.iter().enumerate().find(|(i, p)| p.id.index() != *i) {
        return Err(SimError::Config(format!(
            "agent ids must be contiguous from 0: position {i} holds {}",
            p.id
        )));
    }

    catalog
        .validate_roles(profiles.iter().map(|p| p.role))
        .map_err(|e| SimError::Config(e.to_string()))?;

    transitions.validate()?;
    if let Some(p) = profiles
        .iter()
        .find(|p| !p.is_adversarial() && transitions.row(p.role, BenignState::Start).is_none())
    {
        return Err(SimError::Config(format!("no transition table for role {}", p.role)));
    }
    Ok(())
}
