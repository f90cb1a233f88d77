//! The `AgentBehavior` trait and the `Agent` dispatch enum.

use org_agent::AgentProfile;
use org_core::{AgentId, AgentRng};

use crate::{AdversarialAgent, BenignAgent, Intent, StepContext};

/// A stateful decision-maker.
///
/// Implementations own all of their mutable state and are driven by exactly
/// one caller at a time (the stepped scheduler or the agent's own worker),
/// so `step` takes `&mut self` and nothing needs to be `Sync`.
///
/// Randomness comes only from the `AgentRng` passed in, which keeps a run
/// reproducible for a given seed.
pub trait AgentBehavior: Send + 'static {
    /// Decide the next action.
    ///
    /// May return a non-actionable placeholder (see
    /// [`Intent::is_actionable`]); callers skip those.
    fn step(&mut self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Intent;

    /// Report the execution outcome of the last actionable intent.
    fn react(&mut self, success: bool, rng: &mut AgentRng);
}

impl AgentBehavior for BenignAgent {
    fn step(&mut self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Intent {
        BenignAgent::step(self, ctx, rng)
    }

    fn react(&mut self, success: bool, _rng: &mut AgentRng) {
        BenignAgent::react(self, success)
    }
}

impl AgentBehavior for AdversarialAgent {
    fn step(&mut self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Intent {
        AdversarialAgent::step(self, ctx, rng)
    }

    fn react(&mut self, success: bool, rng: &mut AgentRng) {
        AdversarialAgent::react(self, success, rng)
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// One member of the simulated population.
pub enum Agent {
    Benign(BenignAgent),
    Adversarial(AdversarialAgent),
}

impl Agent {
    /// Build the variant matching the profile's role.
    pub fn from_profile(profile: AgentProfile, rng: &mut AgentRng) -> Self {
        if profile.is_adversarial() {
            Agent::Adversarial(AdversarialAgent::new(profile, rng))
        } else {
            Agent::Benign(BenignAgent::new(profile))
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        match self {
            Agent::Benign(a)      => a.profile(),
            Agent::Adversarial(a) => a.profile(),
        }
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.profile().id
    }

    #[inline]
    pub fn is_adversarial(&self) -> bool {
        matches!(self, Agent::Adversarial(_))
    }

    /// Benign agents are active inside a session; adversaries always are.
    pub fn is_active(&self) -> bool {
        match self {
            Agent::Benign(a)      => a.is_active(),
            Agent::Adversarial(_) => true,
        }
    }

    /// Close the benign agent's session.  No-op for adversaries.
    pub fn force_logout(&mut self) -> bool {
        match self {
            Agent::Benign(a)      => a.force_logout(),
            Agent::Adversarial(_) => false,
        }
    }

    pub fn is_low_and_slow(&self) -> bool {
        match self {
            Agent::Benign(_)      => false,
            Agent::Adversarial(a) => a.is_low_and_slow(),
        }
    }

    /// Current stress of a benign agent (0 for adversaries).
    pub fn stress(&self) -> f64 {
        match self {
            Agent::Benign(a)      => a.stress(),
            Agent::Adversarial(_) => 0.0,
        }
    }

    pub fn as_benign(&self) -> Option<&BenignAgent> {
        match self {
            Agent::Benign(a) => Some(a),
            Agent::Adversarial(_) => None,
        }
    }

    pub fn as_adversarial(&self) -> Option<&AdversarialAgent> {
        match self {
            Agent::Adversarial(a) => Some(a),
            Agent::Benign(_) => None,
        }
    }
}

impl AgentBehavior for Agent {
    fn step(&mut self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Intent {
        match self {
            Agent::Benign(a)      => a.step(ctx, rng),
            Agent::Adversarial(a) => a.step(ctx, rng),
        }
    }

    fn react(&mut self, success: bool, rng: &mut AgentRng) {
        match self {
            Agent::Benign(a)      => a.react(success),
            Agent::Adversarial(a) => a.react(success, rng),
        }
    }
}
