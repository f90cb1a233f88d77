//! office: a small organization simulated end to end.
//!
//! Twelve employees across six departments plus two adversaries.  The demo
//! first runs one simulated week on the stepped scheduler (deterministic for
//! the seed), then hands the accumulated database state to the real-time
//! runtime for a few wall-clock seconds.  Both phases go through the same
//! assess → translate → execute → ingest pipeline against a fake backend.
//!
//! Set `ORGSIM_CONFIG=path/to/config.json` to override any part of
//! [`DemoConfig`]; set `RUST_LOG` to change verbosity.

mod backend;

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use org_agent::{load_population_reader, RoleCatalog};
use org_complexity::ComplexityController;
use org_core::{AgentRng, SimConfig, SteppedClock, VirtualClock};
use org_feedback::{DatabaseStateStore, DatabaseStateSynchronizer};
use org_schedule::load_holidays_reader;
use org_sim::{
    ContextAssembler, Dispatcher, Executor, LogObserver, RuntimeConfig, Scheduler,
    SchedulerBuilder, SimObserver, SimRuntime, SimStats, Translator,
};

use backend::{FakeExecutor, SqlSketchTranslator};

// ── Constants ─────────────────────────────────────────────────────────────────

const CONFIG_ENV:       &str = "ORGSIM_CONFIG";
const LOG_EVERY_TICKS:  u64  = 12 * 24; // one info line per simulated day

// ── Embedded data ─────────────────────────────────────────────────────────────

const POPULATION_CSV: &str = "\
agent_id,username,role,expertise,work_intensity,hierarchy_level,seniority_respect,skill,stealth\n\
0,alice,sales,intermediate,1.3,1,false,,\n\
1,bruno,sales,novice,1.0,1,false,,\n\
2,chen,hr,intermediate,0.9,2,false,,\n\
3,dana,finance,advanced,1.1,2,false,,\n\
4,emeka,finance,expert,1.0,3,true,,\n\
5,farah,engineering,expert,1.2,2,false,,\n\
6,gus,engineering,advanced,0.8,1,false,,\n\
7,hana,support,novice,1.0,1,false,,\n\
8,ivan,support,intermediate,1.4,1,false,,\n\
9,jo,management,intermediate,1.0,4,true,,\n\
10,kai,management,advanced,0.9,5,true,,\n\
11,lena,it_admin,expert,1.0,2,false,,\n\
12,mallory,adversary,intermediate,1.0,1,false,intermediate,false\n\
13,oscar,adversary,advanced,1.0,1,false,advanced,true\n\
";

const HOLIDAYS_CSV: &str = "\
date\n\
2024-01-01\n\
2024-01-15\n\
";

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    sim:                   SimConfig,
    runtime:               RuntimeConfig,
    /// Wall-clock length of the real-time phase.
    realtime_secs:         u64,
    /// Simulated seconds per real second during the real-time phase.
    realtime_acceleration: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sim:                   SimConfig::default(),
            runtime:               RuntimeConfig::default(),
            realtime_secs:         3,
            realtime_acceleration: 1_200.0,
        }
    }
}

fn load_config() -> Result<DemoConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {CONFIG_ENV}={path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
        }
        Err(_) => Ok(DemoConfig::default()),
    }
}

fn make_rngs(seed: u64, count: usize) -> Vec<AgentRng> {
    (0..count as u32).map(|i| AgentRng::new(seed, org_core::AgentId(i))).collect()
}

// ── Stepped driver ────────────────────────────────────────────────────────────

/// One scheduler tick, with every emitted intent sent through the pipeline
/// and its outcome routed back.  Returns how many executions succeeded.
///
/// Executions are stamped with the tick's start time: `Scheduler::tick`
/// has already moved the clock on by the time they run.
async fn run_tick<O: SimObserver>(
    scheduler:  &mut Scheduler<SteppedClock>,
    dispatcher: &Dispatcher,
    assembler:  &ContextAssembler,
    observer:   &mut O,
    minutes:    u32,
) -> u64 {
    let tick_start = scheduler.now();
    observer.on_tick_start(tick_start);
    let intents = scheduler.tick(minutes);

    let decided_at = SteppedClock::new(tick_start);
    let phase = scheduler.gate().phase(tick_start);
    let mut succeeded = 0;
    for intent in &intents {
        observer.on_intent(intent);
        let Some(agent) = scheduler.agent(intent.actor) else { continue };
        let ctx = assembler.assemble(agent, intent, &phase, dispatcher.snapshot(&intent.target));
        let history = scheduler.history(intent.actor).cloned().unwrap_or_default();
        let ok = dispatcher.dispatch(intent, &ctx, &history, &decided_at).await;
        succeeded += u64::from(ok);
        scheduler.react(intent.actor, ok);
    }
    observer.on_tick_end(scheduler.now(), intents.len());
    succeeded
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).compact().init();

    let config = load_config()?;
    config.runtime.validate()?;

    let profiles = load_population_reader(Cursor::new(POPULATION_CSV))?;
    let holidays = load_holidays_reader(Cursor::new(HOLIDAYS_CSV))?;
    let catalog = Arc::new(RoleCatalog::builtin());
    info!(agents = profiles.len(), "population loaded");

    let translator: Arc<dyn Translator> = Arc::new(SqlSketchTranslator);
    let executor: Arc<dyn Executor> = Arc::new(FakeExecutor);

    // ── Phase 1: one stepped week ─────────────────────────────────────────────

    let store = DatabaseStateStore::new();
    let stats = Arc::new(SimStats::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let (sync, sync_join) =
        DatabaseStateSynchronizer::spawn(config.runtime.sync.clone(), store.clone(), stop_rx)?;

    let dispatcher = Dispatcher::new(
        Arc::new(ComplexityController::new(config.runtime.controller.clone())?),
        Arc::clone(&translator),
        Arc::clone(&executor),
        sync,
        Arc::clone(&stats),
    );
    let assembler = ContextAssembler::new(Arc::clone(&catalog)).with_event(config.runtime.event);

    let mut scheduler = SchedulerBuilder::new(
        config.sim.make_stepped_clock(),
        profiles.clone(),
        make_rngs(config.sim.seed, profiles.len()),
    )
    .catalog(Arc::clone(&catalog))
    .holidays(holidays.clone())
    .cooldown_policy(config.runtime.cooldown)
    .store(store.clone())
    .stats(Arc::clone(&stats))
    .build()?;

    let mut observer = LogObserver::new(LOG_EVERY_TICKS);
    let wall = Instant::now();
    let mut succeeded = 0u64;

    for tick in 1..=config.sim.total_ticks {
        succeeded += run_tick(&mut scheduler, &dispatcher, &assembler, &mut observer, config.sim.tick_minutes).await;

        if tick.is_multiple_of(LOG_EVERY_TICKS) {
            let live = dispatcher.live_stats();
            info!(
                at      = %scheduler.now(),
                intents = live.total_intents,
                failed  = live.failed_executions,
                backlog = live.backlog,
                "stepped progress"
            );
        }
    }

    let week = scheduler.finish(&mut observer);
    drop(dispatcher);
    stop_tx.send(true).ok();
    let sync_report = sync_join.await?;

    println!("── Stepped week ─────────────────────────────────────────────");
    println!("  wall time        : {:.2?}", wall.elapsed());
    println!("  intents          : {}", week.total_intents);
    println!("  anomalous        : {}", week.anomalous_intents);
    println!("  succeeded        : {succeeded}");
    println!("  feedback applied : {}", sync_report.processed);
    println!("{}", serde_json::to_string_pretty(&week)?);

    // ── Phase 2: real time, continuing from the week's end ────────────────────

    let clock = VirtualClock::new(config.sim.end_time(), config.realtime_acceleration)?;
    let runtime = SimRuntime::new(
        clock,
        profiles.clone(),
        make_rngs(config.sim.seed.wrapping_add(1), profiles.len()),
        translator,
        executor,
    )
    .with_config(config.runtime)
    .with_catalog(catalog)
    .with_holidays(holidays)
    .with_store(store);

    let handle = runtime.spawn()?;
    info!(agents = handle.agent_count(), secs = config.realtime_secs, "real-time phase started");
    for _ in 0..config.realtime_secs {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let live = handle.stats();
        info!(
            active  = live.active_agents,
            intents = live.total_intents,
            backlog = live.backlog,
            "real-time progress"
        );
    }
    let report = handle.shutdown().await;

    println!("── Real-time phase ──────────────────────────────────────────");
    println!("  intents          : {}", report.intents);
    println!("  executed         : {}", report.executed);
    println!("  feedback applied : {}", report.feedback_processed);
    println!("  backlog at stop  : {}", report.stats.backlog);
    println!("{}", serde_json::to_string_pretty(&report.stats)?);

    Ok(())
}
