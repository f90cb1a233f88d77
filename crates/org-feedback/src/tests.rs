//! Unit tests for org-feedback.

use org_core::{AgentId, NaiveDate, SimTime};

use crate::{ConstraintKind, ErrorClass, ExecutionFeedback};

fn t0() -> SimTime {
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap()
}

fn insert_ok(resource: &str, table: &str, rows: u64, at: SimTime) -> ExecutionFeedback {
    ExecutionFeedback::success(
        AgentId(1),
        resource,
        format!("INSERT INTO {table} (id) VALUES (1)"),
        12.0,
        rows,
        at,
    )
}

fn fk_failure(resource: &str, at: SimTime) -> ExecutionFeedback {
    ExecutionFeedback::failure(
        AgentId(2),
        resource,
        "INSERT INTO orders (customer_id) VALUES (999)",
        8.0,
        ErrorClass::Constraint(ConstraintKind::ForeignKey),
        at,
    )
}

#[cfg(test)]
mod shape {
    use crate::StatementShape;

    fn table(q: &str) -> Option<String> {
        StatementShape::classify(q).table().map(str::to_string)
    }

    #[test]
    fn leading_keywords() {
        assert!(matches!(StatementShape::classify("insert into t values (1)"), StatementShape::Insert { .. }));
        assert!(matches!(StatementShape::classify("DELETE FROM t"), StatementShape::Delete { .. }));
        assert!(matches!(StatementShape::classify("UPDATE t SET a = 1"), StatementShape::Update { .. }));
        assert!(matches!(StatementShape::classify("SELECT * FROM t"), StatementShape::Select { .. }));
        assert_eq!(StatementShape::classify("VACUUM"), StatementShape::Other);
        assert_eq!(StatementShape::classify("   "), StatementShape::Other);
    }

    #[test]
    fn table_names() {
        assert_eq!(table("INSERT INTO public.\"Orders\"(id) VALUES (1)").as_deref(), Some("orders"));
        assert_eq!(table("delete from `customers` where id = 3").as_deref(), Some("customers"));
        assert_eq!(table("SELECT a,b FROM items, other").as_deref(), Some("items"));
        assert_eq!(table("UPDATE staff SET x = 1").as_deref(), Some("staff"));
        assert_eq!(table("SELECT 1"), None);
    }

    #[test]
    fn comments_and_parentheses_are_skipped() {
        let q = "/* audit:abc */ -- note\n  (SELECT id FROM payroll)";
        assert!(matches!(StatementShape::classify(q), StatementShape::Select { .. }));
        assert_eq!(table(q).as_deref(), Some("payroll"));
        assert_eq!(StatementShape::classify("/* unterminated"), StatementShape::Other);
    }
}

#[cfg(test)]
mod state {
    use org_core::TimeDelta;

    use super::{fk_failure, insert_ok, t0};
    use crate::{DatabaseState, ErrorClass, ExecutionFeedback, SyncConfig};
    use org_core::AgentId;

    #[test]
    fn inserts_and_deletes_move_entity_counts() {
        let cfg = SyncConfig::default();
        let mut state = DatabaseState::new("sales_db");
        state.apply(&insert_ok("sales_db", "orders", 3, t0()), &cfg);
        state.apply(&insert_ok("sales_db", "orders", 0, t0()), &cfg);
        assert_eq!(state.entity_count("orders"), Some(4));

        let delete = ExecutionFeedback::success(AgentId(1), "sales_db", "DELETE FROM orders WHERE id < 10", 5.0, 10, t0());
        state.apply(&delete, &cfg);
        assert_eq!(state.entity_count("orders"), Some(0));
    }

    #[test]
    fn constraint_violation_logs_without_touching_counts() {
        let cfg = SyncConfig::default();
        let mut state = DatabaseState::new("sales_db");
        state.apply(&insert_ok("sales_db", "orders", 1, t0()), &cfg);
        let before = state.entity_counts().clone();

        state.apply(&fk_failure("sales_db", t0()), &cfg);
        assert_eq!(state.violations().len(), 1);
        assert_eq!(state.violations()[0].table.as_deref(), Some("orders"));
        assert_eq!(state.entity_counts(), &before);
        assert_eq!(state.failed_queries(), 1);
    }

    #[test]
    fn non_constraint_failures_are_not_violations() {
        let cfg = SyncConfig::default();
        let mut state = DatabaseState::new("hr_db");
        let fb = ExecutionFeedback::failure(AgentId(0), "hr_db", "SELEC oops", 1.0, ErrorClass::Syntax, t0());
        state.apply(&fb, &cfg);
        assert!(state.violations().is_empty());
        assert_eq!(state.last_error().map(|e| e.class), Some(ErrorClass::Syntax));
    }

    #[test]
    fn collections_stay_bounded() {
        let cfg = SyncConfig { latency_window: 10, violation_cap: 5, ..SyncConfig::default() };
        let mut state = DatabaseState::new("sales_db");
        for i in 0..100 {
            state.apply(&fk_failure("sales_db", t0() + TimeDelta::seconds(i)), &cfg);
        }
        assert_eq!(state.violations().len(), 5);
        assert_eq!(state.recent_latencies().count(), 10);
        assert_eq!(state.total_queries(), 100);
        // Oldest entries were evicted.
        assert_eq!(state.violations()[0].observed_at, t0() + TimeDelta::seconds(95));
    }

    #[test]
    fn rolling_latency_and_slow_queries() {
        let cfg = SyncConfig { latency_window: 2, ..SyncConfig::default() };
        let mut state = DatabaseState::new("finance_db");
        for latency in [100.0, 3_000.0, 500.0] {
            let mut fb = insert_ok("finance_db", "ledger", 1, t0());
            fb.latency_ms = latency;
            state.apply(&fb, &cfg);
        }
        assert_eq!(state.avg_latency_ms(), 1_750.0);
        assert_eq!(state.slow_queries(), 1);
        assert!((state.slow_fraction() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn timestamps_only_move_forward() {
        let cfg = SyncConfig::default();
        let mut state = DatabaseState::new("sales_db");
        let late = t0() + TimeDelta::minutes(10);
        state.apply(&fk_failure("sales_db", late), &cfg);

        let stale = ExecutionFeedback::failure(AgentId(0), "sales_db", "SELECT 1", 1.0, ErrorClass::Timeout, t0());
        state.apply(&stale, &cfg);

        assert_eq!(state.last_updated(), Some(late));
        assert!(state.last_error().unwrap().class.is_constraint());
    }
}

#[cfg(test)]
mod store {
    use std::sync::Arc;

    use super::{fk_failure, insert_ok, t0};
    use crate::{DatabaseStateStore, SyncConfig};

    #[test]
    fn state_is_created_lazily() {
        let store = DatabaseStateStore::new();
        assert!(store.snapshot("sales_db").is_none());
        store.apply(&insert_ok("sales_db", "orders", 1, t0()), &SyncConfig::default());
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot("sales_db").unwrap().entity_count("orders"), Some(1));
    }

    #[test]
    fn old_snapshots_are_unaffected_by_writes() {
        let store = DatabaseStateStore::new();
        let cfg = SyncConfig::default();
        store.apply(&insert_ok("sales_db", "orders", 1, t0()), &cfg);
        let before = store.snapshot("sales_db").unwrap();

        store.apply(&fk_failure("sales_db", t0()), &cfg);
        let after = store.snapshot("sales_db").unwrap();

        assert!(before.violations().is_empty());
        assert_eq!(after.violations().len(), 1);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn snapshots_are_sorted_and_seeding_works() {
        let store = DatabaseStateStore::new();
        store.seed_entity_count("hr_db", "employees", 250);
        store.apply(&insert_ok("finance_db", "ledger", 1, t0()), &SyncConfig::default());
        let names: Vec<String> = store.snapshots().iter().map(|s| s.resource().to_string()).collect();
        assert_eq!(names, ["finance_db", "hr_db"]);
        assert_eq!(store.snapshot("hr_db").unwrap().entity_count("employees"), Some(250));
        assert_eq!(store.snapshot("hr_db").unwrap().total_queries(), 0);
    }

    #[test]
    fn concurrent_seed_and_apply_both_land() {
        let store = DatabaseStateStore::new();
        let cfg = SyncConfig::default();

        std::thread::scope(|scope| {
            let writer = store.clone();
            scope.spawn(move || {
                for _ in 0..2_000 {
                    writer.apply(&insert_ok("sales_db", "orders", 1, t0()), &cfg);
                }
            });
            let seeder = store.clone();
            scope.spawn(move || {
                for n in 1..=2_000 {
                    seeder.seed_entity_count("sales_db", "customers", n);
                }
            });
        });

        let state = store.snapshot("sales_db").unwrap();
        assert_eq!(state.entity_count("orders"), Some(2_000));
        assert_eq!(state.entity_count("customers"), Some(2_000));
    }
}

#[cfg(test)]
mod sync {
    use std::time::Duration;

    use tokio::sync::watch;

    use super::{fk_failure, insert_ok, t0};
    use crate::{DatabaseStateStore, DatabaseStateSynchronizer, SyncConfig, SyncError};

    #[tokio::test]
    async fn drains_queue_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let store = DatabaseStateStore::new();
        let (handle, join) = DatabaseStateSynchronizer::spawn(SyncConfig::default(), store.clone(), rx).unwrap();

        for _ in 0..500 {
            handle.ingest(insert_ok("sales_db", "orders", 1, t0())).unwrap();
        }
        handle.ingest(fk_failure("sales_db", t0())).unwrap();
        tx.send(true).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(5), join).await.unwrap().unwrap();
        assert_eq!(report.processed, 501);
        assert_eq!(handle.backlog(), 0);

        let state = store.snapshot("sales_db").unwrap();
        assert_eq!(state.entity_count("orders"), Some(500));
        assert_eq!(state.violations().len(), 1);
    }

    #[tokio::test]
    async fn ingest_after_exit_is_rejected() {
        let (tx, rx) = watch::channel(false);
        let (handle, join) =
            DatabaseStateSynchronizer::spawn(SyncConfig::default(), DatabaseStateStore::new(), rx).unwrap();
        drop(tx);
        join.await.unwrap();

        let err = handle.ingest(insert_ok("sales_db", "orders", 1, t0())).unwrap_err();
        assert!(matches!(err, SyncError::Closed));
        assert_eq!(handle.backlog(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_accepted_ingest_is_applied_across_shutdown() {
        let (tx, rx) = watch::channel(false);
        let store = DatabaseStateStore::new();
        let (handle, join) = DatabaseStateSynchronizer::spawn(SyncConfig::default(), store.clone(), rx).unwrap();

        let producer = tokio::spawn(async move {
            let mut accepted = 0u64;
            while handle.ingest(insert_ok("sales_db", "orders", 1, t0())).is_ok() {
                accepted += 1;
                tokio::task::yield_now().await;
            }
            accepted
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        let report = tokio::time::timeout(Duration::from_secs(5), join).await.unwrap().unwrap();
        let accepted = tokio::time::timeout(Duration::from_secs(5), producer).await.unwrap().unwrap();

        assert_eq!(report.processed, accepted);
        let applied = store.snapshot("sales_db").and_then(|s| s.entity_count("orders")).unwrap_or(0);
        assert_eq!(applied, accepted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_concurrent_producers() {
        let (tx, rx) = watch::channel(false);
        let store = DatabaseStateStore::new();
        let (handle, join) = DatabaseStateSynchronizer::spawn(SyncConfig::default(), store.clone(), rx).unwrap();

        let producers: Vec<_> = (0..8)
            .map(|p| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    for _ in 0..250 {
                        handle.ingest(insert_ok(&format!("db_{p}"), "t", 1, t0())).unwrap();
                    }
                })
            })
            .collect();
        for p in producers {
            p.await.unwrap();
        }
        tx.send(true).unwrap();

        let report = join.await.unwrap();
        assert_eq!(report.processed, 2_000);
        assert_eq!(store.len(), 8);
        for s in store.snapshots() {
            assert_eq!(s.entity_count("t"), Some(250));
        }
    }

    #[test]
    fn config_validation() {
        assert!(SyncConfig::default().validate().is_ok());
        assert!(SyncConfig { latency_window: 0, ..SyncConfig::default() }.validate().is_err());
        assert!(SyncConfig { slow_threshold_ms: f64::NAN, ..SyncConfig::default() }.validate().is_err());
    }
}
