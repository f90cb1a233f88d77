//! Static agent identity: who the agent is, not what it is doing.
//!
//! A profile is created at population load and never changes.  The mutable
//! behavioral state lives in `org-behavior` and is owned by the agent's
//! worker.

use std::fmt;
use std::str::FromStr;

use org_core::{AgentId, Role};

use crate::AgentError;

// ── SkillLevel ────────────────────────────────────────────────────────────────

/// Attacker sophistication.  Only meaningful for adversarial agents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum SkillLevel {
    Novice,
    #[default]
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Novice       => "novice",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced     => "advanced",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice"       => Ok(SkillLevel::Novice),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced"     => Ok(SkillLevel::Advanced),
            other => Err(AgentError::Parse(format!("unknown skill level {other:?}"))),
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ExpertiseLevel ────────────────────────────────────────────────────────────

/// How fluent the user is with the data systems they touch.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ExpertiseLevel {
    Novice,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl ExpertiseLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpertiseLevel::Novice       => "novice",
            ExpertiseLevel::Intermediate => "intermediate",
            ExpertiseLevel::Advanced     => "advanced",
            ExpertiseLevel::Expert       => "expert",
        }
    }
}

impl FromStr for ExpertiseLevel {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice"       => Ok(ExpertiseLevel::Novice),
            "intermediate" => Ok(ExpertiseLevel::Intermediate),
            "advanced"     => Ok(ExpertiseLevel::Advanced),
            "expert"       => Ok(ExpertiseLevel::Expert),
            other => Err(AgentError::Parse(format!("unknown expertise level {other:?}"))),
        }
    }
}

// ── AgentProfile ──────────────────────────────────────────────────────────────

/// Immutable identity and disposition of one simulated actor.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AgentProfile {
    pub id:        AgentId,
    pub username:  String,
    pub role:      Role,

    /// Attack sophistication (adversaries only; ignored for benign roles).
    pub skill:     SkillLevel,

    /// Data-system fluency, feeds the complexity controller.
    pub expertise: ExpertiseLevel,

    /// Workload multiplier.  > 1 means the agent works harder than baseline:
    /// high-engagement actions are favored and cooldowns shrink.
    pub work_intensity: f64,

    /// Position in the org chart, 1 (individual contributor) to 5 (executive).
    pub hierarchy_level: u8,

    /// Whether the agent's culture defers to seniority.
    pub seniority_respect: bool,

    /// Adversaries only: operate in low-and-slow mode.
    pub stealth: bool,
}

impl AgentProfile {
    /// A profile with neutral defaults for everything except identity.
    pub fn new(id: AgentId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username:          username.into(),
            role,
            skill:             SkillLevel::default(),
            expertise:         ExpertiseLevel::default(),
            work_intensity:    1.0,
            hierarchy_level:   1,
            seniority_respect: false,
            stealth:           false,
        }
    }

    #[inline]
    pub fn is_adversarial(&self) -> bool {
        self.role.is_adversarial()
    }

    pub fn with_work_intensity(mut self, work_intensity: f64) -> Self {
        self.work_intensity = work_intensity;
        self
    }

    pub fn with_skill(mut self, skill: SkillLevel) -> Self {
        self.skill = skill;
        self
    }

    pub fn with_expertise(mut self, expertise: ExpertiseLevel) -> Self {
        self.expertise = expertise;
        self
    }

    pub fn with_hierarchy(mut self, level: u8, seniority_respect: bool) -> Self {
        self.hierarchy_level = level;
        self.seniority_respect = seniority_respect;
        self
    }

    pub fn with_stealth(mut self, stealth: bool) -> Self {
        self.stealth = stealth;
        self
    }
}
