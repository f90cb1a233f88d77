//! The four factor functions.  Each maps one slice of the context to [0, 1].

use serde::{Deserialize, Serialize};

use org_agent::ExpertiseLevel;

use crate::context::{
    BusinessContext, BusinessEvent, CulturalContext, DataSensitivity, TemporalContext, UserContext,
    WorkflowType,
};

/// Per-factor values of one assessment, kept for logging and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub expertise: f64,
    pub business:  f64,
    pub temporal:  f64,
    pub cultural:  f64,
}

#[inline]
fn unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn expertise_base(level: ExpertiseLevel) -> f64 {
    match level {
        ExpertiseLevel::Novice       => 0.2,
        ExpertiseLevel::Intermediate => 0.5,
        ExpertiseLevel::Advanced     => 0.75,
        ExpertiseLevel::Expert       => 0.95,
    }
}

fn workflow_base(workflow: WorkflowType) -> f64 {
    match workflow {
        WorkflowType::Routine       => 0.2,
        WorkflowType::Lookup        => 0.3,
        WorkflowType::Transactional => 0.45,
        WorkflowType::Audit         => 0.6,
        WorkflowType::Reporting     => 0.7,
        WorkflowType::Analytics     => 0.9,
    }
}

fn sensitivity_adjustment(sensitivity: DataSensitivity) -> f64 {
    match sensitivity {
        DataSensitivity::Public       => 0.05,
        DataSensitivity::Internal     => 0.0,
        DataSensitivity::Confidential => -0.05,
        DataSensitivity::Restricted   => -0.1,
    }
}

fn event_adjustment(event: BusinessEvent) -> f64 {
    match event {
        BusinessEvent::QuarterEnd    => 0.15,
        BusinessEvent::Audit         => 0.1,
        BusinessEvent::ProductLaunch => 0.05,
        BusinessEvent::Incident      => -0.1,
    }
}

/// Expertise tier, attenuated by up to half under full stress.
pub fn expertise_factor(user: &UserContext) -> f64 {
    unit(expertise_base(user.expertise) * (1.0 - 0.5 * user.stress))
}

pub fn business_factor(business: &BusinessContext) -> f64 {
    let event = business.event.map_or(0.0, event_adjustment);
    unit(workflow_base(business.workflow) + sensitivity_adjustment(business.sensitivity) + event)
}

/// Holiday beats off-hours, off-hours beats lunch, lunch beats peak.
pub fn temporal_factor(temporal: &TemporalContext) -> f64 {
    let base = if temporal.is_holiday {
        0.3
    } else if temporal.off_hours {
        0.4
    } else if temporal.is_lunch {
        0.5
    } else if temporal.is_peak {
        0.8
    } else {
        0.6
    };
    unit(base * temporal.activity_intensity)
}

pub fn cultural_factor(cultural: &CulturalContext) -> f64 {
    let mut factor = 0.2 * f64::from(cultural.hierarchy_level);
    if cultural.seniority_respect {
        factor -= 0.1;
    }
    if cultural.sensitive_domain {
        factor -= 0.1;
    }
    unit(factor)
}
