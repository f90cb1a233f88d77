//! Markov-driven benign employee.
//!
//! Each `step` does three things in order:
//!
//! 1. Update the stress side-channel: up while working outside the shift,
//!    down inside it.  Above the fatigue threshold the agent is fatigued.
//! 2. Sample the next state from the role's transition row.  Weights of
//!    high-engagement states are scaled by the agent's work intensity first.
//! 3. Emit the state as an intent, unless the agent is fatigued and the
//!    operator-error draw fires, in which case an `OperatorError` is emitted
//!    instead (never flagged anomalous).
//!
//! Failures reported through `react` build frustration; past the limit the
//! agent logs out and its session context is dropped.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use org_agent::AgentProfile;
use org_core::{AgentRng, SessionId};

use crate::{Action, BenignState, Intent, StepContext};

// ── Tuning ────────────────────────────────────────────────────────────────────

/// Constants of the stress and frustration side-channels.
#[derive(Copy, Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenignTuning {
    /// Stress added per step outside declared work hours.
    pub stress_off_hours:  f64,
    /// Stress removed per step inside declared work hours.
    pub stress_relief:     f64,
    /// Stress above which the agent counts as fatigued.
    pub fatigue_threshold: f64,
    /// Chance that a fatigued agent's action becomes an operator error.
    pub operator_error_p:  f64,
    /// Frustration added per failed execution.
    pub frustration_step:  f64,
    /// Frustration above which the agent gives up and logs out.
    pub frustration_limit: f64,
}

impl Default for BenignTuning {
    fn default() -> Self {
        Self {
            stress_off_hours:  0.1,
            stress_relief:     0.05,
            fatigue_threshold: 0.7,
            operator_error_p:  0.2,
            frustration_step:  0.25,
            frustration_limit: 0.7,
        }
    }
}

// ── BenignAgent ───────────────────────────────────────────────────────────────

pub struct BenignAgent {
    profile:     AgentProfile,
    tuning:      BenignTuning,
    state:       BenignState,
    session:     SessionId,
    context:     BTreeMap<String, String>,
    stress:      f64,
    frustration: f64,
    fatigued:    bool,
    sequence:    u64,
}

impl BenignAgent {
    pub fn new(profile: AgentProfile) -> Self {
        Self::with_tuning(profile, BenignTuning::default())
    }

    pub fn with_tuning(profile: AgentProfile, tuning: BenignTuning) -> Self {
        let mut agent = Self {
            profile,
            tuning,
            state:       BenignState::Start,
            session:     SessionId(0),
            context:     BTreeMap::new(),
            stress:      0.0,
            frustration: 0.0,
            fatigued:    false,
            sequence:    0,
        };
        agent.reset_context();
        agent
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn state(&self) -> BenignState {
        self.state
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn stress(&self) -> f64 {
        self.stress
    }

    pub fn frustration(&self) -> f64 {
        self.frustration
    }

    pub fn is_fatigued(&self) -> bool {
        self.fatigued
    }

    pub fn session_context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// `true` while the agent is inside a session doing work.
    pub fn is_active(&self) -> bool {
        self.state.is_actionable()
    }

    /// Override the stress level (clamped to [0, 1]).
    pub fn set_stress(&mut self, stress: f64) {
        self.stress = if stress.is_nan() { 0.0 } else { stress.clamp(0.0, 1.0) };
        self.fatigued = self.stress > self.tuning.fatigue_threshold;
    }

    /// End the session because the agent's shift closed on it.
    ///
    /// Returns `true` if the agent was active.
    pub fn force_logout(&mut self) -> bool {
        let was_active = self.is_active();
        if was_active {
            debug!(agent = %self.profile.id, "forced logout");
            self.log_out();
        }
        was_active
    }

    pub fn step(&mut self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Intent {
        self.update_stress(ctx.in_work_hours);

        if self.state == BenignState::LoggedOut {
            self.open_session();
        }

        let Some(next) = self.sample_next(ctx, rng) else {
            warn!(
                agent = %self.profile.id,
                role  = %self.profile.role,
                state = %self.state,
                "no outgoing transitions; resetting to start",
            );
            self.state = BenignState::Start;
            return Intent::placeholder(self.profile.id, BenignState::Start);
        };

        self.state = next;
        if !next.is_actionable() {
            if next == BenignState::LoggedOut {
                self.log_out();
            }
            return Intent::placeholder(self.profile.id, next);
        }

        let emitted = if self.fatigued && rng.gen_bool(self.tuning.operator_error_p) {
            BenignState::OperatorError
        } else {
            next
        };

        let target = rng
            .choose(ctx.catalog.resources_for(self.profile.role))
            .cloned()
            .unwrap_or_default();

        self.sequence += 1;
        self.record_action(emitted, &target);

        let mut params = BTreeMap::new();
        params.insert("session_id".to_string(), self.session.0.to_string());
        params.insert("sequence".to_string(), self.sequence.to_string());

        debug!(
            agent  = %self.profile.id,
            action = %emitted,
            target = %target,
            stress = self.stress,
            "benign step",
        );

        Intent {
            actor: self.profile.id,
            action: Action::Benign(emitted),
            params,
            target,
            is_anomaly: false,
            bypass: None,
        }
    }

    pub fn react(&mut self, success: bool) {
        if success {
            self.frustration *= 0.5;
            return;
        }
        self.frustration = (self.frustration + self.tuning.frustration_step).min(1.0);
        if self.frustration > self.tuning.frustration_limit {
            debug!(agent = %self.profile.id, "frustrated; logging out");
            self.log_out();
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn update_stress(&mut self, in_work_hours: bool) {
        let delta = if in_work_hours {
            -self.tuning.stress_relief
        } else {
            self.tuning.stress_off_hours
        };
        self.set_stress(self.stress + delta);
    }

    fn sample_next(&self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Option<BenignState> {
        let row = ctx.transitions.row(self.profile.role, self.state)?;
        let intensity = self.profile.work_intensity;
        let weights: Vec<f64> = row
            .iter()
            .map(|&(to, w)| if to.is_high_engagement() { w * intensity } else { w })
            .collect();
        let idx = rng.weighted_index(&weights)?;
        Some(row[idx].0)
    }

    fn open_session(&mut self) {
        self.session = self.session.next();
        self.state = BenignState::Start;
        self.reset_context();
    }

    fn log_out(&mut self) {
        self.state = BenignState::LoggedOut;
        self.frustration = 0.0;
        self.context.clear();
    }

    fn reset_context(&mut self) {
        self.context.clear();
        self.context.insert("session_id".to_string(), self.session.0.to_string());
        self.context.insert("actions_in_session".to_string(), "0".to_string());
    }

    fn record_action(&mut self, state: BenignState, resource: &str) {
        let count = self
            .context
            .get("actions_in_session")
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);
        self.context.insert("session_id".to_string(), self.session.0.to_string());
        self.context.insert("actions_in_session".to_string(), (count + 1).to_string());
        self.context.insert("last_state".to_string(), state.as_str().to_string());
        self.context.insert("last_resource".to_string(), resource.to_string());
    }
}
