//! Assembles the complexity controller's input from one decision.

use std::sync::Arc;

use org_agent::RoleCatalog;
use org_behavior::{Action, Agent, AttackStep, BenignState, Intent};
use org_complexity::{
    BusinessContext, BusinessEvent, CulturalContext, DataSensitivity, QueryContext,
    TemporalContext, UserContext, WorkflowType,
};
use org_feedback::DatabaseState;
use org_schedule::TemporalPhase;

/// The business process an action belongs to.
pub fn workflow_for(action: Action) -> WorkflowType {
    match action {
        Action::Benign(state) => match state {
            BenignState::Login | BenignState::Search | BenignState::ViewRecord => WorkflowType::Lookup,
            BenignState::CreateRecord | BenignState::UpdateRecord | BenignState::DeleteRecord => {
                WorkflowType::Transactional
            }
            BenignState::GenerateReport => WorkflowType::Reporting,
            BenignState::ExportData     => WorkflowType::Analytics,
            BenignState::Start
            | BenignState::Idle
            | BenignState::OperatorError
            | BenignState::LoggedOut => WorkflowType::Routine,
        },
        Action::Attack(step) => match step {
            AttackStep::Reconnaissance
            | AttackStep::EnumerateSchema
            | AttackStep::EnumeratePermissions => WorkflowType::Audit,
            AttackStep::LoginAttempt => WorkflowType::Routine,
            AttackStep::ProbeInjection | AttackStep::UnionExtract | AttackStep::TrickleRead => {
                WorkflowType::Lookup
            }
            AttackStep::EscalatePrivilege | AttackStep::TamperRecords | AttackStep::CoverTracks => {
                WorkflowType::Transactional
            }
            AttackStep::BulkRead | AttackStep::Exfiltrate => WorkflowType::Analytics,
        },
    }
}

/// Weekends count as off-hours, not as holidays.
pub fn temporal_context(p: &TemporalPhase) -> TemporalContext {
    TemporalContext {
        hour:               p.hour,
        is_holiday:         p.is_holiday,
        is_lunch:           p.is_lunch,
        is_peak:            p.is_peak,
        off_hours:          p.off_hours,
        activity_intensity: p.activity_intensity,
    }
}

/// Builds a [`QueryContext`] per emitted intent.
#[derive(Clone, Debug)]
pub struct ContextAssembler {
    catalog: Arc<RoleCatalog>,
    event:   Option<BusinessEvent>,
}

impl ContextAssembler {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog, event: None }
    }

    /// Attach an organization-wide event to every assembled context.
    pub fn with_event(mut self, event: Option<BusinessEvent>) -> Self {
        self.event = event;
        self
    }

    /// High-value resources are confidential; the rest are internal.
    pub fn sensitivity_of(&self, resource: &str) -> DataSensitivity {
        if self.catalog.high_value_resources().iter().any(|r| r == resource) {
            DataSensitivity::Confidential
        } else {
            DataSensitivity::Internal
        }
    }

    pub fn assemble(
        &self,
        agent:    &Agent,
        intent:   &Intent,
        phase:    &TemporalPhase,
        database: Option<Arc<DatabaseState>>,
    ) -> QueryContext {
        let profile = agent.profile();
        let sensitivity = self.sensitivity_of(&intent.target);
        QueryContext {
            user: UserContext {
                role:      profile.role,
                expertise: profile.expertise,
                stress:    agent.stress(),
            },
            business: BusinessContext {
                workflow: workflow_for(intent.action),
                sensitivity,
                event:    self.event,
            },
            temporal: temporal_context(phase),
            cultural: CulturalContext {
                hierarchy_level:   profile.hierarchy_level,
                seniority_respect: profile.seniority_respect,
                sensitive_domain:  sensitivity != DataSensitivity::Internal,
            },
            database,
        }
    }
}
