//! Execution feedback: the executor's report on one statement.

use std::fmt;

use serde::{Deserialize, Serialize};

use org_core::{AgentId, SimTime};

/// Kind of integrity constraint a statement tripped.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    NotNull,
    Check,
}

/// Executor-side classification of a failure.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Constraint(ConstraintKind),
    PermissionDenied,
    Syntax,
    Timeout,
    Connection,
    Other,
}

impl ErrorClass {
    /// Referential or integrity-constraint failures; these go to the
    /// violation log.
    #[inline]
    pub fn is_constraint(self) -> bool {
        matches!(self, ErrorClass::Constraint(_))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Constraint(ConstraintKind::ForeignKey) => "foreign_key_violation",
            ErrorClass::Constraint(ConstraintKind::Unique)     => "unique_violation",
            ErrorClass::Constraint(ConstraintKind::NotNull)    => "not_null_violation",
            ErrorClass::Constraint(ConstraintKind::Check)      => "check_violation",
            ErrorClass::PermissionDenied                       => "permission_denied",
            ErrorClass::Syntax                                 => "syntax_error",
            ErrorClass::Timeout                                => "timeout",
            ErrorClass::Connection                             => "connection_error",
            ErrorClass::Other                                  => "other",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one execution.  Consumed exactly once by the
/// synchronizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFeedback {
    pub query:       String,
    pub success:     bool,
    pub latency_ms:  f64,
    pub error:       Option<ErrorClass>,
    /// Rows affected (writes) or returned (reads).
    pub rows:        u64,
    pub resource:    String,
    pub actor:       AgentId,
    /// Simulated time at which the executor observed the outcome.
    pub observed_at: SimTime,
}

impl ExecutionFeedback {
    pub fn success(
        actor:       AgentId,
        resource:    impl Into<String>,
        query:       impl Into<String>,
        latency_ms:  f64,
        rows:        u64,
        observed_at: SimTime,
    ) -> Self {
        Self {
            query: query.into(),
            success: true,
            latency_ms,
            error: None,
            rows,
            resource: resource.into(),
            actor,
            observed_at,
        }
    }

    pub fn failure(
        actor:       AgentId,
        resource:    impl Into<String>,
        query:       impl Into<String>,
        latency_ms:  f64,
        error:       ErrorClass,
        observed_at: SimTime,
    ) -> Self {
        Self {
            query: query.into(),
            success: false,
            latency_ms,
            error: Some(error),
            rows: 0,
            resource: resource.into(),
            actor,
            observed_at,
        }
    }

    /// `true` when the feedback carries a constraint classification.
    pub fn is_constraint_violation(&self) -> bool {
        self.error.is_some_and(ErrorClass::is_constraint)
    }
}
