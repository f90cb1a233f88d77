//! Stand-in translator and executor so the demo runs without a database.
//!
//! The translator writes plausible SQL inside the assessed strategy.  The
//! executor never touches a database: it derives latency and outcome from
//! the intent itself, so a stepped run stays reproducible.

use async_trait::async_trait;

use org_behavior::{Action, BenignState, Intent};
use org_complexity::Assessment;
use org_core::SimTime;
use org_feedback::{ConstraintKind, ErrorClass, ExecutionFeedback};
use org_sim::{Executor, Translator};

/// First table of each demo database.
fn primary_table(resource: &str) -> &'static str {
    match resource {
        "sales_db"     => "orders",
        "hr_db"        => "employees",
        "finance_db"   => "ledger",
        "inventory_db" => "stock",
        "support_db"   => "tickets",
        _              => "accounts",
    }
}

pub struct SqlSketchTranslator;

impl Translator for SqlSketchTranslator {
    fn translate(&self, intent: &Intent, assessment: &Assessment) -> String {
        let s = &assessment.strategy;
        let table = primary_table(&intent.target);
        let joins: String = (1..=s.max_joins.min(s.max_tables.saturating_sub(1)))
            .map(|j| format!(" JOIN {table}_ref{j} r{j} ON r{j}.id = t.ref{j}_id"))
            .collect();

        match intent.action {
            Action::Benign(BenignState::CreateRecord) => {
                format!("INSERT INTO {table} (created_by) VALUES ('{}')", intent.actor.0)
            }
            Action::Benign(BenignState::UpdateRecord) => {
                format!("UPDATE {table} SET touched = 1 WHERE id = {}", intent.param("sequence").unwrap_or("0"))
            }
            Action::Benign(BenignState::DeleteRecord) => {
                format!("DELETE FROM {table} WHERE id = {}", intent.param("sequence").unwrap_or("0"))
            }
            Action::Benign(BenignState::GenerateReport) if s.allow_aggregation => {
                format!("SELECT t.status, COUNT(*) FROM {table} t{joins} GROUP BY t.status")
            }
            _ => format!("SELECT t.* FROM {table} t{joins} LIMIT 50"),
        }
    }
}

/// Deterministic fake backend.
pub struct FakeExecutor;

#[async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, query: &str, intent: &Intent) -> ExecutionFeedback {
        let seq: u64 = intent.param("sequence").and_then(|s| s.parse().ok()).unwrap_or(0);
        let joins = query.matches(" JOIN ").count() as f64;
        let latency = 4.0 + 6.0 * joins + (seq % 7) as f64;
        let at = SimTime::default();

        let failure = match intent.action {
            Action::Benign(BenignState::OperatorError) => Some(ErrorClass::Syntax),
            Action::Benign(BenignState::DeleteRecord) if seq % 5 == 0 => {
                Some(ErrorClass::Constraint(ConstraintKind::ForeignKey))
            }
            Action::Benign(BenignState::CreateRecord) if seq % 11 == 0 => {
                Some(ErrorClass::Constraint(ConstraintKind::Unique))
            }
            Action::Attack(_) => match &intent.bypass {
                Some(meta) if !meta.obfuscated => Some(ErrorClass::PermissionDenied),
                _ => None,
            },
            _ => None,
        };

        match failure {
            Some(class) => ExecutionFeedback::failure(intent.actor, intent.target.clone(), query, latency, class, at),
            None => ExecutionFeedback::success(intent.actor, intent.target.clone(), query, latency, 1, at),
        }
    }
}
