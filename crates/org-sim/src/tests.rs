//! Integration tests for org-sim.

use std::sync::Arc;

use async_trait::async_trait;

use org_agent::AgentProfile;
use org_behavior::Intent;
use org_complexity::Assessment;
use org_core::{AgentId, AgentRng, NaiveDate, Role, SimTime, SteppedClock};
use org_feedback::{ConstraintKind, ErrorClass, ExecutionFeedback};

use crate::{Executor, Scheduler, SchedulerBuilder, Translator};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn at(day: u32, hour: u32, minute: u32) -> SimTime {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(hour, minute, 0).unwrap()
}

/// Monday 2024-01-08.
fn monday_at(hour: u32, minute: u32) -> SimTime {
    at(8, hour, minute)
}

fn sales_agent() -> (Vec<AgentProfile>, Vec<AgentRng>) {
    let profile = AgentProfile::new(AgentId(0), "sales_000", Role::Sales).with_work_intensity(1.3);
    (vec![profile], vec![AgentRng::new(42, AgentId(0))])
}

fn sales_scheduler(start: SimTime) -> Scheduler<SteppedClock> {
    let (profiles, rngs) = sales_agent();
    SchedulerBuilder::new(SteppedClock::new(start), profiles, rngs).build().unwrap()
}

struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(&self, intent: &Intent, assessment: &Assessment) -> String {
        format!("-- {} tier={}\nSELECT * FROM records", intent.action, assessment.tier)
    }
}

/// Succeeds every query with a fixed latency.
struct OkExecutor;

#[async_trait]
impl Executor for OkExecutor {
    async fn execute(&self, query: &str, intent: &Intent) -> ExecutionFeedback {
        ExecutionFeedback::success(intent.actor, intent.target.clone(), query, 12.0, 1, SimTime::default())
    }
}

/// Fails every query with a foreign-key violation.
struct ConstraintExecutor;

#[async_trait]
impl Executor for ConstraintExecutor {
    async fn execute(&self, _query: &str, intent: &Intent) -> ExecutionFeedback {
        ExecutionFeedback::failure(
            intent.actor,
            intent.target.clone(),
            "INSERT INTO orders (customer_id) VALUES (999)",
            3.0,
            ErrorClass::Constraint(ConstraintKind::ForeignKey),
            SimTime::default(),
        )
    }
}

// ── SchedulerBuilder validation ───────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use std::collections::BTreeMap;

    use org_agent::{RoleCatalog, RoleSpec};
    use org_behavior::TransitionTable;
    use org_core::WorkHours;

    use super::*;
    use crate::SimError;

    #[test]
    fn builds_with_defaults() {
        let s = sales_scheduler(monday_at(9, 0));
        assert_eq!(s.agents().len(), 1);
        assert!(!s.is_shut_down());
    }

    #[test]
    fn rng_count_mismatch_errors() {
        let (profiles, _) = sales_agent();
        let result = SchedulerBuilder::new(SteppedClock::new(monday_at(9, 0)), profiles, vec![]).build();
        assert!(matches!(result, Err(SimError::AgentCountMismatch { expected: 1, got: 0, .. })));
    }

    #[test]
    fn non_contiguous_ids_error() {
        let profile = AgentProfile::new(AgentId(3), "sales_003", Role::Sales);
        let result = SchedulerBuilder::new(
            SteppedClock::new(monday_at(9, 0)),
            vec![profile],
            vec![AgentRng::new(1, AgentId(3))],
        )
        .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn role_without_resources_errors() {
        let mut specs = BTreeMap::new();
        specs.insert(Role::Sales, RoleSpec { hours: WorkHours::new(8, 18), resources: vec!["sales_db".into()] });
        let catalog = Arc::new(RoleCatalog::new(specs, vec![]));

        let profile = AgentProfile::new(AgentId(0), "hr_000", Role::Hr);
        let result = SchedulerBuilder::new(
            SteppedClock::new(monday_at(9, 0)),
            vec![profile],
            vec![AgentRng::new(1, AgentId(0))],
        )
        .catalog(catalog)
        .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn role_without_transitions_errors() {
        let (profiles, rngs) = sales_agent();
        let result = SchedulerBuilder::new(SteppedClock::new(monday_at(9, 0)), profiles, rngs)
            .transitions(Arc::new(TransitionTable::new()))
            .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}

// ── Scheduler tick loop ───────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler_tests {
    use org_behavior::{Action, BenignState};
    use org_core::SimClock;
    use org_schedule::GatePolicy;

    use super::*;
    use crate::{NoopObserver, SimObserver, StatsSnapshot};

    #[test]
    fn sales_agent_acts_on_monday_morning() {
        let mut s = sales_scheduler(monday_at(9, 0));
        let intents = s.tick(5);

        assert_eq!(intents.len(), 1);
        let intent = &intents[0];
        assert_eq!(intent.actor, AgentId(0));
        assert_eq!(intent.anomaly_label(), 0);
        assert_eq!(intent.action, Action::Benign(BenignState::Login));
        assert!(["sales_db", "inventory_db"].contains(&intent.target.as_str()));

        assert_eq!(s.now(), monday_at(9, 5));
        assert_eq!(s.stats().total_intents, 1);
        assert_eq!(s.stats().active_agents, 1);
    }

    #[test]
    fn sales_agent_is_silent_on_sunday() {
        let mut s = sales_scheduler(at(7, 9, 0));
        assert!(s.tick(5).is_empty());
        assert_eq!(s.stats().total_intents, 0);
    }

    #[test]
    fn short_cooldowns_are_floored_to_one_tick() {
        let mut s = sales_scheduler(monday_at(9, 0));
        s.tick(5);
        // Login waits at most 2 / 1.3 × 1.2 minutes, well under one tick.
        assert_eq!(s.cooldown_until(AgentId(0)), Some(monday_at(9, 5)));
    }

    #[test]
    fn cooling_down_agent_is_skipped() {
        let mut s = sales_scheduler(monday_at(9, 0));
        assert_eq!(s.tick(1).len(), 1);
        // The cooldown ends between 09:01:13 and 09:01:51.
        assert!(s.tick(1).is_empty());
    }

    #[test]
    fn closing_gate_logs_the_agent_out() {
        let mut s = sales_scheduler(monday_at(9, 0));
        s.tick(9 * 60);
        assert!(s.agent(AgentId(0)).unwrap().is_active());

        // 18:00 is past the sales shift.
        assert_eq!(s.now(), monday_at(18, 0));
        assert!(s.tick(5).is_empty());
        let agent = s.agent(AgentId(0)).unwrap();
        assert!(!agent.is_active());
        assert_eq!(agent.as_benign().unwrap().state(), BenignState::LoggedOut);
        assert_eq!(s.stats().active_agents, 0);
    }

    #[test]
    fn adversary_intents_are_anomalous() {
        let profile = AgentProfile::new(AgentId(0), "adversary_000", Role::Adversary);
        let mut s = SchedulerBuilder::new(
            SteppedClock::new(monday_at(10, 0)),
            vec![profile],
            vec![AgentRng::new(7, AgentId(0))],
        )
        .gate_policy(GatePolicy { adversary_business_p: 1.0, ..GatePolicy::default() })
        .build()
        .unwrap();

        let intents = s.tick(5);
        assert_eq!(intents.len(), 1);
        assert!(intents[0].is_anomaly);
        assert!(intents[0].bypass.is_some());
        assert!(matches!(intents[0].action, Action::Attack(_)));
    }

    #[test]
    fn adversary_kept_out_by_the_gate_is_not_active() {
        let build = |policy: GatePolicy| {
            let profile = AgentProfile::new(AgentId(0), "adversary_000", Role::Adversary);
            SchedulerBuilder::new(
                SteppedClock::new(monday_at(10, 0)),
                vec![profile],
                vec![AgentRng::new(7, AgentId(0))],
            )
            .gate_policy(policy)
            .build()
            .unwrap()
        };

        let mut closed = build(GatePolicy { adversary_business_p: 0.0, ..GatePolicy::default() });
        assert!(closed.tick(5).is_empty());
        assert_eq!(closed.stats().active_agents, 0);

        let mut open = build(GatePolicy { adversary_business_p: 1.0, ..GatePolicy::default() });
        assert_eq!(open.tick(5).len(), 1);
        assert_eq!(open.stats().active_agents, 1);
        // Still counted while cooling down between steps.
        open.tick(1);
        assert_eq!(open.stats().active_agents, 1);
    }

    #[test]
    fn shutdown_stops_emitting_and_freezes_clock() {
        let mut s = sales_scheduler(monday_at(9, 0));
        s.shutdown();
        assert!(s.tick(5).is_empty());
        assert_eq!(s.now(), monday_at(9, 0));
        assert_eq!(s.run_ticks(10, 5, &mut NoopObserver), 0);
    }

    #[derive(Default)]
    struct Counting {
        starts:   usize,
        intents:  usize,
        ends:     usize,
        shutdown: Option<StatsSnapshot>,
    }

    impl SimObserver for Counting {
        fn on_tick_start(&mut self, _now: SimTime) {
            self.starts += 1;
        }
        fn on_intent(&mut self, _intent: &Intent) {
            self.intents += 1;
        }
        fn on_tick_end(&mut self, _now: SimTime, _emitted: usize) {
            self.ends += 1;
        }
        fn on_shutdown(&mut self, stats: &StatsSnapshot) {
            self.shutdown = Some(stats.clone());
        }
    }

    #[test]
    fn run_ticks_reports_to_observer() {
        let mut s = sales_scheduler(monday_at(9, 0));
        let mut obs = Counting::default();
        let emitted = s.run_ticks(12, 5, &mut obs);

        assert_eq!(obs.starts, 12);
        assert_eq!(obs.ends, 12);
        assert_eq!(obs.intents as u64, emitted);
        assert!(emitted >= 1);
        assert_eq!(s.clock().now(), monday_at(10, 0));

        let stats = s.finish(&mut obs);
        assert_eq!(stats.total_intents, emitted);
        assert_eq!(obs.shutdown, Some(stats));
    }

    #[test]
    fn react_feeds_history() {
        let mut s = sales_scheduler(monday_at(9, 0));
        s.tick(5);
        s.react(AgentId(0), false);
        s.react(AgentId(0), true);
        assert_eq!(s.history(AgentId(0)).unwrap().rate(), Some(0.5));

        // Unknown agents are ignored.
        s.react(AgentId(99), true);
    }

    #[test]
    fn same_seed_same_run() {
        let run = || {
            let mut s = sales_scheduler(monday_at(8, 0));
            (0..200).flat_map(|_| s.tick(5)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}

// ── Context assembly ──────────────────────────────────────────────────────────

#[cfg(test)]
mod context_tests {
    use org_agent::RoleCatalog;
    use org_behavior::{Action, Agent, AttackStep, BenignState};
    use org_complexity::{DataSensitivity, WorkflowType};
    use org_schedule::ActivityGate;

    use super::*;
    use crate::{workflow_for, ContextAssembler};

    #[test]
    fn workflow_mapping() {
        assert_eq!(workflow_for(Action::Benign(BenignState::Search)), WorkflowType::Lookup);
        assert_eq!(workflow_for(Action::Benign(BenignState::UpdateRecord)), WorkflowType::Transactional);
        assert_eq!(workflow_for(Action::Benign(BenignState::GenerateReport)), WorkflowType::Reporting);
        assert_eq!(workflow_for(Action::Benign(BenignState::ExportData)), WorkflowType::Analytics);
        assert_eq!(workflow_for(Action::Attack(AttackStep::EnumerateSchema)), WorkflowType::Audit);
        assert_eq!(workflow_for(Action::Attack(AttackStep::Exfiltrate)), WorkflowType::Analytics);
    }

    #[test]
    fn high_value_targets_are_confidential() {
        let catalog = Arc::new(RoleCatalog::builtin());
        let assembler = ContextAssembler::new(Arc::clone(&catalog));
        assert_eq!(assembler.sensitivity_of("finance_db"), DataSensitivity::Confidential);
        assert_eq!(assembler.sensitivity_of("sales_db"), DataSensitivity::Internal);

        let (mut profiles, mut rngs) = sales_agent();
        let profile = profiles.remove(0).with_hierarchy(3, true);
        let agent = Agent::from_profile(profile, &mut rngs[0]);

        let mut intent = Intent::placeholder(AgentId(0), BenignState::Start);
        intent.action = Action::Benign(BenignState::GenerateReport);
        intent.target = "finance_db".into();

        let phase = ActivityGate::new(catalog).phase(monday_at(10, 30));
        let ctx = assembler.assemble(&agent, &intent, &phase, None);

        assert_eq!(ctx.user.role, Role::Sales);
        assert_eq!(ctx.business.workflow, WorkflowType::Reporting);
        assert_eq!(ctx.business.sensitivity, DataSensitivity::Confidential);
        assert!(ctx.cultural.sensitive_domain);
        assert_eq!(ctx.cultural.hierarchy_level, 3);
        assert!(ctx.temporal.is_peak);
        assert!(!ctx.temporal.off_hours);
        assert!(ctx.database.is_none());
    }
}

// ── Dispatcher and runtime ────────────────────────────────────────────────────

#[cfg(test)]
mod runtime_tests {
    use std::time::Duration;

    use tokio::sync::watch;

    use org_complexity::{ComplexityController, SuccessWindow};
    use org_core::VirtualClock;
    use org_feedback::{DatabaseStateStore, DatabaseStateSynchronizer, SyncConfig};

    use super::*;
    use crate::{ContextAssembler, Dispatcher, SimRuntime, SimStats};

    #[tokio::test]
    async fn constraint_failure_is_logged_not_counted() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let store = DatabaseStateStore::new();
        let (sync, join) = DatabaseStateSynchronizer::spawn(SyncConfig::default(), store.clone(), stop_rx).unwrap();
        let stats = Arc::new(SimStats::new());
        let dispatcher = Dispatcher::new(
            Arc::new(ComplexityController::default()),
            Arc::new(EchoTranslator),
            Arc::new(ConstraintExecutor),
            sync,
            Arc::clone(&stats),
        );

        let mut s = sales_scheduler(monday_at(9, 0));
        let mut intent = s.tick(5).remove(0);
        intent.target = "sales_db".into();

        let assembler = ContextAssembler::new(Arc::new(org_agent::RoleCatalog::builtin()));
        let phase = s.gate().phase(monday_at(9, 0));
        let agent = s.agent(AgentId(0)).unwrap();
        let ctx = assembler.assemble(agent, &intent, &phase, dispatcher.snapshot("sales_db"));

        let ok = dispatcher.dispatch(&intent, &ctx, &SuccessWindow::default(), s.clock()).await;
        assert!(!ok);
        s.react(AgentId(0), ok);

        stop_tx.send(true).unwrap();
        assert_eq!(join.await.unwrap().processed, 1);

        let db = store.snapshot("sales_db").unwrap();
        assert_eq!(db.violations().len(), 1);
        assert_eq!(db.violations()[0].kind, ConstraintKind::ForeignKey);
        assert!(db.entity_counts().is_empty());
        assert_eq!(db.last_updated(), Some(monday_at(9, 5)));

        let snap = stats.snapshot();
        assert_eq!((snap.executions, snap.failed_executions), (1, 1));
    }

    #[tokio::test]
    async fn live_stats_report_queued_feedback() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let store = DatabaseStateStore::new();
        let (sync, join) = DatabaseStateSynchronizer::spawn(SyncConfig::default(), store.clone(), stop_rx).unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(ComplexityController::default()),
            Arc::new(EchoTranslator),
            Arc::new(OkExecutor),
            sync,
            Arc::new(SimStats::new()),
        );

        let mut s = sales_scheduler(monday_at(9, 0));
        let intent = s.tick(5).remove(0);
        let assembler = ContextAssembler::new(Arc::new(org_agent::RoleCatalog::builtin()));
        let phase = s.gate().phase(monday_at(9, 0));
        let ctx = assembler.assemble(s.agent(AgentId(0)).unwrap(), &intent, &phase, None);

        // The current-thread runtime never yields to the synchronizer here,
        // so everything dispatched stays queued.
        for _ in 0..3 {
            dispatcher.dispatch(&intent, &ctx, &SuccessWindow::default(), s.clock()).await;
        }
        let live = dispatcher.live_stats();
        assert_eq!(live.backlog, 3);
        assert_eq!(live.executions, 3);

        stop_tx.send(true).unwrap();
        assert_eq!(join.await.unwrap().processed, 3);
        assert_eq!(dispatcher.live_stats().backlog, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runtime_runs_and_shuts_down() {
        // One real millisecond is one simulated minute.
        let clock = VirtualClock::new(monday_at(9, 0), 60_000.0).unwrap();
        let (profiles, rngs) = sales_agent();
        let handle = SimRuntime::new(clock, profiles, rngs, Arc::new(EchoTranslator), Arc::new(OkExecutor))
            .spawn()
            .unwrap();
        assert_eq!(handle.agent_count(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let live = handle.stats();
        assert!(live.total_intents >= 1);

        let report = tokio::time::timeout(Duration::from_secs(10), handle.shutdown())
            .await
            .expect("shutdown timed out");

        assert!(report.intents >= 1);
        assert_eq!(report.intents, report.executed);
        assert_eq!(report.feedback_processed, report.executed);
        assert_eq!(report.stats.total_intents, report.intents);
        assert_eq!(report.stats.active_agents, 0);

        let queries: u64 = report.stats.databases.iter().map(|d| d.total_queries).sum();
        assert_eq!(queries, report.executed);
    }

    #[tokio::test]
    async fn idle_runtime_stops_promptly() {
        // Sunday: the gate turns the only agent away on every check.
        let clock = VirtualClock::new(at(7, 9, 0), 1.0).unwrap();
        let (profiles, rngs) = sales_agent();
        let handle = SimRuntime::new(clock, profiles, rngs, Arc::new(EchoTranslator), Arc::new(OkExecutor))
            .spawn()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let report = tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .expect("worker ignored shutdown during its idle sleep");
        assert_eq!(report.intents, 0);
        assert_eq!(report.feedback_processed, 0);
    }
}
