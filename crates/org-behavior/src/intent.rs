//! Agent intents: the abstract actions handed to the translator.

use std::collections::BTreeMap;
use std::fmt;

use org_core::AgentId;

use crate::{AttackStep, BenignState, BypassTechnique};

// ── Action ────────────────────────────────────────────────────────────────────

/// What the agent wants to do, independent of any query language.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Action {
    Benign(BenignState),
    Attack(AttackStep),
}

impl Action {
    /// `false` for the benign session placeholders (`Start`, `LoggedOut`).
    /// Attack steps are always actionable.
    #[inline]
    pub fn is_actionable(self) -> bool {
        match self {
            Action::Benign(state) => state.is_actionable(),
            Action::Attack(_)     => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Benign(state) => state.as_str(),
            Action::Attack(step)  => step.as_str(),
        }
    }

    /// Simulated minutes of think time that typically follow this action,
    /// before intensity scaling and jitter.
    pub fn base_wait_minutes(self) -> f64 {
        match self {
            Action::Benign(state) => match state {
                BenignState::Login          => 2.0,
                BenignState::OperatorError  => 2.0,
                BenignState::Search         => 3.0,
                BenignState::ViewRecord     => 4.0,
                BenignState::DeleteRecord   => 5.0,
                BenignState::UpdateRecord   => 6.0,
                BenignState::CreateRecord   => 8.0,
                BenignState::Idle           => 10.0,
                BenignState::ExportData     => 15.0,
                BenignState::GenerateReport => 20.0,
                BenignState::Start | BenignState::LoggedOut => 0.0,
            },
            Action::Attack(step) => step.base_wait_minutes(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Benign(state) => write!(f, "benign:{state}"),
            Action::Attack(step)  => write!(f, "attack:{step}"),
        }
    }
}

// ── BypassMeta ────────────────────────────────────────────────────────────────

/// Evasion metadata carried by adversarial intents.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct BypassMeta {
    pub technique:  BypassTechnique,
    pub obfuscated: bool,
    /// The adversary's detection-avoidance level when the intent was made.
    pub evasion:    f64,
}

// ── Intent ────────────────────────────────────────────────────────────────────

/// One decision of one agent.  Consumed exactly once by the translator.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Intent {
    pub actor:      AgentId,
    pub action:     Action,
    pub params:     BTreeMap<String, String>,
    /// Name of the backing resource the action targets.  Empty for
    /// placeholders.
    pub target:     String,
    pub is_anomaly: bool,
    pub bypass:     Option<BypassMeta>,
}

impl Intent {
    /// A non-actionable marker for a benign session boundary.
    pub fn placeholder(actor: AgentId, state: BenignState) -> Self {
        Self {
            actor,
            action:     Action::Benign(state),
            params:     BTreeMap::new(),
            target:     String::new(),
            is_anomaly: false,
            bypass:     None,
        }
    }

    #[inline]
    pub fn is_actionable(&self) -> bool {
        self.action.is_actionable()
    }

    /// The anomaly flag as a dataset label (0 or 1).
    #[inline]
    pub fn anomaly_label(&self) -> u8 {
        u8::from(self.is_anomaly)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
