//! The inputs of one complexity assessment.
//!
//! A `QueryContext` is assembled per intent and dropped after the
//! assessment.  The database snapshot is a shared, immutable `Arc`; holding
//! it never blocks the synchronizer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use org_agent::ExpertiseLevel;
use org_core::Role;
use org_feedback::DatabaseState;

/// Kind of business process the query serves.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Routine,
    Lookup,
    Transactional,
    Audit,
    Reporting,
    Analytics,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSensitivity {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
}

/// Organization-wide event that shifts how people query.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessEvent {
    QuarterEnd,
    Audit,
    ProductLaunch,
    Incident,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub role:      Role,
    pub expertise: ExpertiseLevel,
    /// In [0, 1].
    pub stress:    f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub workflow:    WorkflowType,
    pub sensitivity: DataSensitivity,
    pub event:       Option<BusinessEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalContext {
    /// 0..=23.
    pub hour:               u32,
    pub is_holiday:         bool,
    pub is_lunch:           bool,
    pub is_peak:            bool,
    pub off_hours:          bool,
    /// In [0, 1].
    pub activity_intensity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CulturalContext {
    /// 1..=5.
    pub hierarchy_level:   u8,
    pub seniority_respect: bool,
    pub sensitive_domain:  bool,
}

#[derive(Clone, Debug)]
pub struct QueryContext {
    pub user:     UserContext,
    pub business: BusinessContext,
    pub temporal: TemporalContext,
    pub cultural: CulturalContext,
    /// Live state of the target resource; `None` before any feedback.
    pub database: Option<Arc<DatabaseState>>,
}
