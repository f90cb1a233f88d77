//! The stepped `Scheduler` and its tick loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use org_behavior::{Agent, AgentBehavior, Intent, StepContext, TransitionTable};
use org_complexity::SuccessWindow;
use org_core::{AgentId, AgentRng, SimClock, SimTime, TimeDelta};
use org_feedback::DatabaseStateStore;
use org_schedule::{ActivityGate, CooldownPolicy, CooldownRequest, CooldownTable};

use crate::{SimObserver, SimStats, StatsSnapshot};

// ── Per-tick inputs shared by every decision ──────────────────────────────────

/// Read-only view handed to every agent's decision.  Everything here is
/// `Sync`, so the decision phase can run in parallel.
struct TickEnv<'a> {
    now:         SimTime,
    tick:        TimeDelta,
    activity:    f64,
    gate:        &'a ActivityGate,
    transitions: &'a TransitionTable,
    cooldowns:   &'a CooldownTable,
    policy:      &'a CooldownPolicy,
}

/// Result of one agent's decision.
struct Decision {
    intent:   Intent,
    cooldown: TimeDelta,
}

/// What one agent did this tick.  `admitted` is `None` when the agent was
/// still cooling down and the gate was not consulted.
#[derive(Default)]
struct Outcome {
    admitted: Option<bool>,
    decision: Option<Decision>,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Drives the population one tick at a time.
///
/// Each tick:
///
/// 1. **Decide** (optionally parallel with the `parallel` feature): every
///    agent that is off cooldown and admitted by the [`ActivityGate`] takes
///    one `step`.  Agents the gate turns away are logged out.
/// 2. **Apply** (sequential, ascending `AgentId`): start the cooldown of
///    every agent that emitted an actionable intent and collect the intents.
/// 3. Advance the clock by the tick length.
///
/// Create via [`SchedulerBuilder`][crate::SchedulerBuilder].
pub struct Scheduler<C: SimClock> {
    pub(crate) clock:           C,
    pub(crate) agents:          Vec<Agent>,
    pub(crate) rngs:            Vec<AgentRng>,
    pub(crate) windows:         Vec<SuccessWindow>,
    pub(crate) gate:            ActivityGate,
    pub(crate) transitions:     Arc<TransitionTable>,
    pub(crate) cooldowns:       CooldownTable,
    /// Most recent gate verdict per agent.
    pub(crate) admitted:        Vec<bool>,
    pub(crate) cooldown_policy: CooldownPolicy,
    pub(crate) stats:           Arc<SimStats>,
    pub(crate) store:           Option<DatabaseStateStore>,
    pub(crate) shut_down:       bool,
}

impl<C: SimClock> Scheduler<C> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Process one tick of `minutes` simulated minutes and return the emitted
    /// intents in ascending agent order.
    ///
    /// After [`shutdown`](Self::shutdown) this returns nothing and leaves the
    /// clock where it is.
    pub fn tick(&mut self, minutes: u32) -> Vec<Intent> {
        if self.shut_down {
            return Vec::new();
        }
        let tick = TimeDelta::minutes(i64::from(minutes));
        let now = self.clock.now();

        let outcomes = self.decide(now, tick);

        // ── Apply phase ───────────────────────────────────────────────────
        let mut intents = Vec::with_capacity(outcomes.iter().filter(|o| o.decision.is_some()).count());
        for (i, outcome) in outcomes.into_iter().enumerate() {
            if let Some(admitted) = outcome.admitted {
                self.admitted[i] = admitted;
            }
            if let Some(Decision { intent, cooldown }) = outcome.decision {
                self.cooldowns.start(self.agents[i].id(), now, cooldown);
                self.stats.record_intent(&intent);
                intents.push(intent);
            }
        }
        self.cooldowns.purge(now);
        self.stats.set_active(self.active_count());

        self.clock.advance(tick);
        intents
    }

    /// Drive `n` ticks, reporting to `observer`.  Returns the number of
    /// intents emitted.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, minutes: u32, observer: &mut O) -> u64 {
        let mut emitted = 0u64;
        for _ in 0..n {
            if self.shut_down {
                break;
            }
            let now = self.clock.now();
            observer.on_tick_start(now);
            let intents = self.tick(minutes);
            for intent in &intents {
                observer.on_intent(intent);
            }
            observer.on_tick_end(now, intents.len());
            emitted += intents.len() as u64;
        }
        emitted
    }

    /// Route an execution outcome back to the agent that issued the intent.
    pub fn react(&mut self, agent: AgentId, success: bool) {
        let i = agent.index();
        let (Some(a), Some(rng)) = (self.agents.get_mut(i), self.rngs.get_mut(i)) else {
            warn!(%agent, "reaction for unknown agent ignored");
            return;
        };
        a.react(success, rng);
        if let Some(window) = self.windows.get_mut(i) {
            window.record(success);
        }
    }

    /// Stop emitting.  Further ticks are no-ops.
    pub fn shutdown(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            info!(total_intents = self.stats.total_intents(), "scheduler shutdown requested");
        }
    }

    /// [`shutdown`](Self::shutdown), then report final stats to `observer`.
    pub fn finish<O: SimObserver>(&mut self, observer: &mut O) -> StatsSnapshot {
        self.shutdown();
        let stats = self.stats();
        observer.on_shutdown(&stats);
        stats
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Active-agent and total-intent counts, plus database summaries when a
    /// store is attached.
    pub fn stats(&self) -> StatsSnapshot {
        match &self.store {
            Some(store) => self.stats.snapshot_with(store),
            None => self.stats.snapshot(),
        }
    }

    pub fn shared_stats(&self) -> &Arc<SimStats> {
        &self.stats
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn gate(&self) -> &ActivityGate {
        &self.gate
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Mutable access for tests and scripted scenarios.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    /// Recent outcomes of `id`, as fed by [`react`](Self::react).
    pub fn history(&self, id: AgentId) -> Option<&SuccessWindow> {
        self.windows.get(id.index())
    }

    pub fn cooldown_until(&self, id: AgentId) -> Option<SimTime> {
        self.cooldowns.expiry(id)
    }

    /// Agents whose last gate check admitted them and whose session is open.
    /// Adversaries have no session, so only the gate verdict counts for them.
    fn active_count(&self) -> usize {
        self.agents
            .iter()
            .zip(&self.admitted)
            .filter(|(agent, admitted)| **admitted && agent.is_active())
            .count()
    }

    // ── Decision phase ────────────────────────────────────────────────────

    fn decide(&mut self, now: SimTime, tick: TimeDelta) -> Vec<Outcome> {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let env = TickEnv {
            now,
            tick,
            activity:    self.gate.activity_intensity(now),
            gate:        &self.gate,
            transitions: &self.transitions,
            cooldowns:   &self.cooldowns,
            policy:      &self.cooldown_policy,
        };
        let agents = &mut self.agents;
        let rngs   = &mut self.rngs;

        #[cfg(not(feature = "parallel"))]
        {
            agents
                .iter_mut()
                .zip(rngs.iter_mut())
                .map(|(agent, rng)| decide_one(agent, rng, &env))
                .collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // `collect` on an indexed parallel iterator keeps input order.
            agents
                .par_iter_mut()
                .zip(rngs.par_iter_mut())
                .map(|(agent, rng)| decide_one(agent, rng, &env))
                .collect()
        }
    }
}

fn decide_one(agent: &mut Agent, rng: &mut AgentRng, env: &TickEnv<'_>) -> Outcome {
    let id = agent.id();
    if !env.cooldowns.is_ready(id, env.now) {
        return Outcome::default();
    }

    if !env.gate.may_act(agent.profile(), env.now, rng) {
        if agent.force_logout() {
            debug!(agent = %id, "gate closed, session ended");
        }
        return Outcome { admitted: Some(false), decision: None };
    }

    let role = agent.profile().role;
    let ctx = StepContext::new(
        env.now,
        env.activity,
        env.gate.in_work_hours(role, env.now),
        env.gate.catalog(),
        env.transitions,
    );
    let intent = agent.step(&ctx, rng);
    if !intent.is_actionable() {
        return Outcome { admitted: Some(true), decision: None };
    }

    let cooldown = env.policy.cooldown(
        CooldownRequest {
            base_wait_minutes:  intent.action.base_wait_minutes(),
            activity_intensity: env.activity,
            work_intensity:     agent.profile().work_intensity,
            low_and_slow:       agent.is_low_and_slow(),
            tick:               env.tick,
        },
        rng,
    );
    debug!(
        agent    = %id,
        action   = %intent.action,
        target   = %intent.target,
        cooldown = cooldown.num_minutes(),
        "agent decided"
    );
    Outcome { admitted: Some(true), decision: Some(Decision { intent, cooldown }) }
}
