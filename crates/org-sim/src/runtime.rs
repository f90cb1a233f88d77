//! Real-time mode: one tokio task per agent.
//!
//! # Worker loop
//!
//! ```text
//! loop:
//!   now = clock.now()
//!   gate rejects       → log out, sleep one idle tick
//!   step → placeholder → sleep one idle tick
//!   step → intent      → assess, translate, execute, ingest, react,
//!                        sleep for the computed cooldown
//! ```
//!
//! Every sleep races the shutdown channel, so a worker exits within one
//! scheduler poll of [`RuntimeHandle::shutdown`] no matter how long its
//! cooldown is.  Intents from different workers may reach the executor out
//! of simulated-time order under load.
//!
//! Shutdown is two-staged: agent workers are stopped and joined first, then
//! the synchronizer is told to stop and drains everything they queued.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use org_agent::{AgentProfile, RoleCatalog};
use org_behavior::{Agent, AgentBehavior, StepContext, TransitionTable};
use org_complexity::{BusinessEvent, ComplexityController, ControllerConfig, SuccessWindow};
use org_core::{AgentRng, SimClock, TimeDelta, VirtualClock};
use org_feedback::{DatabaseStateStore, DatabaseStateSynchronizer, SyncConfig, SyncReport};
use org_schedule::{ActivityGate, CooldownPolicy, CooldownRequest, GatePolicy, HolidayCalendar, IntensityCurve};

use crate::builder::validate_population;
use crate::{ContextAssembler, Dispatcher, Executor, SimError, SimResult, SimStats, StatsSnapshot, Translator};

// ── RuntimeConfig ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Simulated minutes an idle worker waits before checking again.
    pub idle_tick_minutes: u32,
    pub cooldown:          CooldownPolicy,
    pub sync:              SyncConfig,
    pub controller:        ControllerConfig,
    /// Organization-wide event applied to every assessment.
    pub event:             Option<BusinessEvent>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            idle_tick_minutes: 5,
            cooldown:          CooldownPolicy::default(),
            sync:              SyncConfig::default(),
            controller:        ControllerConfig::default(),
            event:             None,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.idle_tick_minutes == 0 {
            return Err(SimError::Config("idle_tick_minutes must be > 0".into()));
        }
        self.cooldown.validate()?;
        self.sync.validate()?;
        self.controller.validate()?;
        Ok(())
    }
}

// ── SimRuntime ────────────────────────────────────────────────────────────────

/// Everything needed to start the workers.  Consumed by [`spawn`](Self::spawn).
pub struct SimRuntime {
    config:      RuntimeConfig,
    clock:       VirtualClock,
    profiles:    Vec<AgentProfile>,
    rngs:        Vec<AgentRng>,
    catalog:     Arc<RoleCatalog>,
    transitions: Arc<TransitionTable>,
    gate_policy: GatePolicy,
    curve:       IntensityCurve,
    holidays:    HolidayCalendar,
    translator:  Arc<dyn Translator>,
    executor:    Arc<dyn Executor>,
    store:       DatabaseStateStore,
}

impl SimRuntime {
    pub fn new(
        clock:      VirtualClock,
        profiles:   Vec<AgentProfile>,
        rngs:       Vec<AgentRng>,
        translator: Arc<dyn Translator>,
        executor:   Arc<dyn Executor>,
    ) -> Self {
        Self {
            config:      RuntimeConfig::default(),
            clock,
            profiles,
            rngs,
            catalog:     Arc::new(RoleCatalog::builtin()),
            transitions: Arc::new(TransitionTable::builtin()),
            gate_policy: GatePolicy::default(),
            curve:       IntensityCurve::default(),
            holidays:    HolidayCalendar::default(),
            translator,
            executor,
            store:       DatabaseStateStore::new(),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<RoleCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_transitions(mut self, transitions: Arc<TransitionTable>) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn with_gate_policy(mut self, policy: GatePolicy) -> Self {
        self.gate_policy = policy;
        self
    }

    pub fn with_curve(mut self, curve: IntensityCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    /// Continue from an existing store, e.g. one warmed by a stepped run.
    pub fn with_store(mut self, store: DatabaseStateStore) -> Self {
        self.store = store;
        self
    }

    /// Validate, start the synchronizer and one worker per agent.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn spawn(self) -> SimResult<RuntimeHandle> {
        validate_population(&self.profiles, self.rngs.len(), &self.catalog, &self.transitions)?;
        self.gate_policy.validate()?;
        self.config.validate()?;

        let (agents_tx, agents_rx) = watch::channel(false);
        let (sync_tx, sync_rx) = watch::channel(false);

        let (sync, sync_join) =
            DatabaseStateSynchronizer::spawn(self.config.sync.clone(), self.store.clone(), sync_rx)?;
        let stats = Arc::new(SimStats::new());
        let controller = Arc::new(ComplexityController::new(self.config.controller.clone())?);
        let dispatcher = Dispatcher::new(
            controller,
            self.translator,
            self.executor,
            sync,
            Arc::clone(&stats),
        );

        let env = Arc::new(WorkerEnv {
            clock:       self.clock,
            gate:        ActivityGate::new(Arc::clone(&self.catalog))
                .with_policy(self.gate_policy)
                .with_curve(self.curve)
                .with_holidays(self.holidays),
            transitions: self.transitions,
            dispatcher,
            assembler:   ContextAssembler::new(self.catalog).with_event(self.config.event),
            cooldown:    self.config.cooldown,
            idle:        TimeDelta::minutes(i64::from(self.config.idle_tick_minutes)),
        });

        let agent_count = self.profiles.len();
        let workers = self
            .profiles
            .into_iter()
            .zip(self.rngs)
            .map(|(profile, mut rng)| {
                let agent = Agent::from_profile(profile, &mut rng);
                tokio::spawn(run_worker(agent, rng, Arc::clone(&env), agents_rx.clone()))
            })
            .collect();

        info!(agents = agent_count, acceleration = env.clock.acceleration(), "runtime started");
        Ok(RuntimeHandle {
            agents_tx,
            sync_tx,
            workers,
            sync_join,
            env,
            store: self.store,
        })
    }
}

// ── RuntimeHandle ─────────────────────────────────────────────────────────────

/// Control side of a running [`SimRuntime`].
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// stops every worker, but nothing is joined.
pub struct RuntimeHandle {
    agents_tx: watch::Sender<bool>,
    sync_tx:   watch::Sender<bool>,
    workers:   Vec<JoinHandle<WorkerReport>>,
    sync_join: JoinHandle<SyncReport>,
    env:       Arc<WorkerEnv>,
    store:     DatabaseStateStore,
}

/// What the runtime did before it stopped.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RuntimeReport {
    pub intents:            u64,
    pub executed:           u64,
    pub feedback_processed: u64,
    pub stats:              StatsSnapshot,
}

impl RuntimeHandle {
    /// Live counters, synchronizer backlog and per-resource summaries.
    pub fn stats(&self) -> StatsSnapshot {
        self.env.dispatcher.live_stats()
    }

    /// Feedback records queued but not yet applied.
    pub fn backlog(&self) -> usize {
        self.env.dispatcher.sync().backlog()
    }

    pub fn store(&self) -> &DatabaseStateStore {
        &self.store
    }

    pub fn agent_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop every worker, then the synchronizer, and wait for all of them.
    pub async fn shutdown(self) -> RuntimeReport {
        info!("runtime shutdown requested");
        // Receivers outlive this send; an error only means every worker is
        // already gone.
        let _ = self.agents_tx.send(true);

        let mut report = RuntimeReport::default();
        for worker in self.workers {
            match worker.await {
                Ok(w) => {
                    report.intents += w.intents;
                    report.executed += w.executed;
                }
                Err(e) => warn!(error = %e, "agent worker failed"),
            }
        }

        let _ = self.sync_tx.send(true);
        match self.sync_join.await {
            Ok(r) => report.feedback_processed = r.processed,
            Err(e) => warn!(error = %e, "synchronizer failed"),
        }

        report.stats = self.env.dispatcher.live_stats();
        info!(
            intents  = report.intents,
            executed = report.executed,
            applied  = report.feedback_processed,
            "runtime stopped"
        );
        report
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// Read-only state shared by every worker.
struct WorkerEnv {
    clock:       VirtualClock,
    gate:        ActivityGate,
    transitions: Arc<TransitionTable>,
    dispatcher:  Dispatcher,
    assembler:   ContextAssembler,
    cooldown:    CooldownPolicy,
    idle:        TimeDelta,
}

#[derive(Copy, Clone, Debug, Default)]
struct WorkerReport {
    intents:  u64,
    executed: u64,
}

async fn run_worker(
    mut agent:    Agent,
    mut rng:      AgentRng,
    env:          Arc<WorkerEnv>,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerReport {
    let id = agent.id();
    let stats = Arc::clone(env.dispatcher.stats());
    let mut window = SuccessWindow::default();
    let mut report = WorkerReport::default();
    let mut active = false;

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let (wait, admitted) = think_and_act(&mut agent, &mut rng, &mut window, &env, &mut report).await;

        let now_active = admitted && agent.is_active();
        if now_active != active {
            if now_active {
                stats.agent_activated();
            } else {
                stats.agent_deactivated();
            }
            active = now_active;
        }

        if sleep_or_shutdown(env.clock.real_duration(wait), &mut shutdown).await {
            break;
        }
    }

    if active {
        stats.agent_deactivated();
    }
    debug!(agent = %id, intents = report.intents, "worker stopped");
    report
}

/// One decision.  Returns how long to wait before the next one and whether
/// the gate admitted the agent.
async fn think_and_act(
    agent:  &mut Agent,
    rng:    &mut AgentRng,
    window: &mut SuccessWindow,
    env:    &WorkerEnv,
    report: &mut WorkerReport,
) -> (TimeDelta, bool) {
    let now = env.clock.now();
    if !env.gate.may_act(agent.profile(), now, rng) {
        if agent.force_logout() {
            debug!(agent = %agent.id(), "gate closed, session ended");
        }
        return (env.idle, false);
    }

    let activity = env.gate.activity_intensity(now);
    let intent = {
        let ctx = StepContext::new(
            now,
            activity,
            env.gate.in_work_hours(agent.profile().role, now),
            env.gate.catalog(),
            &env.transitions,
        );
        agent.step(&ctx, rng)
    };
    if !intent.is_actionable() {
        return (env.idle, true);
    }

    env.dispatcher.stats().record_intent(&intent);
    report.intents += 1;

    let phase = env.gate.phase(now);
    let qctx = env.assembler.assemble(agent, &intent, &phase, env.dispatcher.snapshot(&intent.target));
    let success = env.dispatcher.dispatch(&intent, &qctx, window, &env.clock).await;
    report.executed += 1;

    window.record(success);
    agent.react(success, rng);

    let wait = env.cooldown.cooldown(
        CooldownRequest {
            base_wait_minutes:  intent.action.base_wait_minutes(),
            activity_intensity: activity,
            work_intensity:     agent.profile().work_intensity,
            low_and_slow:       agent.is_low_and_slow(),
            tick:               env.idle,
        },
        rng,
    );
    (wait, true)
}

/// Sleep for `wait` unless shutdown is signalled first.  Returns `true` when
/// the worker should stop.
async fn sleep_or_shutdown(wait: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
        () = tokio::time::sleep(wait) => false,
    }
}
