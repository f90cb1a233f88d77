//! Multi-stage adversarial agent.
//!
//! The adversary walks one [`AttackChain`] step by step.  When the chain
//! runs out it picks another, preferring chains whose technique has not been
//! detected yet.  Failed executions count as detections and make the agent
//! more evasive; an advanced attacker may abandon a burned chain on the spot.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use org_agent::{AgentProfile, SkillLevel};
use org_core::AgentRng;

use crate::{Action, AttackChain, BypassMeta, BypassTechnique, Intent, StepContext};

// ── Tuning ────────────────────────────────────────────────────────────────────

/// Probabilities and step sizes of the adversary's adaptation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AdversaryTuning {
    /// Chance of restricting the next-chain draw to undetected chains.
    pub prefer_undetected_p: f64,
    /// Detection-avoidance gain per failed step (capped at 1).
    pub avoidance_step:      f64,
    /// Chance that an advanced attacker switches chain after a failure.
    pub switch_on_failure_p: f64,
    /// Chance that a success lowers the obfuscation flag.
    pub drop_obfuscation_p:  f64,
}

impl Default for AdversaryTuning {
    fn default() -> Self {
        Self {
            prefer_undetected_p: 0.6,
            avoidance_step:      0.15,
            switch_on_failure_p: 0.4,
            drop_obfuscation_p:  0.3,
        }
    }
}

// ── AdversarialAgent ──────────────────────────────────────────────────────────

pub struct AdversarialAgent {
    profile:             AgentProfile,
    tuning:              AdversaryTuning,
    chain:               AttackChain,
    step_index:          usize,
    detection_avoidance: f64,
    obfuscate:           bool,
    detected:            BTreeSet<BypassTechnique>,
    successful:          BTreeSet<BypassTechnique>,
    chains_started:      u64,
}

impl AdversarialAgent {
    pub fn new(profile: AgentProfile, rng: &mut AgentRng) -> Self {
        Self::with_tuning(profile, AdversaryTuning::default(), rng)
    }

    pub fn with_tuning(profile: AgentProfile, tuning: AdversaryTuning, rng: &mut AgentRng) -> Self {
        let obfuscate = profile.skill >= SkillLevel::Intermediate;
        let chain = *rng.choose(&AttackChain::ALL).unwrap_or(&AttackChain::InjectionProbe);
        Self {
            profile,
            tuning,
            chain,
            step_index:          0,
            detection_avoidance: 0.0,
            obfuscate,
            detected:            BTreeSet::new(),
            successful:          BTreeSet::new(),
            chains_started:      1,
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn chain(&self) -> AttackChain {
        self.chain
    }

    /// Index of the next step to run inside the current chain.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn detection_avoidance(&self) -> f64 {
        self.detection_avoidance
    }

    pub fn is_obfuscating(&self) -> bool {
        self.obfuscate
    }

    pub fn detected_techniques(&self) -> &BTreeSet<BypassTechnique> {
        &self.detected
    }

    pub fn successful_bypasses(&self) -> &BTreeSet<BypassTechnique> {
        &self.successful
    }

    pub fn chains_started(&self) -> u64 {
        self.chains_started
    }

    /// Stealthy agents and drip-feed chains wait much longer between steps.
    pub fn is_low_and_slow(&self) -> bool {
        self.profile.stealth || self.chain.technique() == BypassTechnique::SlowDrip
    }

    /// Seed the detection set, e.g. from a previous run.
    pub fn mark_detected(&mut self, technique: BypassTechnique) {
        self.detected.insert(technique);
    }

    /// Draw the chain to run after the current one.
    ///
    /// With probability `prefer_undetected_p` the draw is limited to chains
    /// whose technique is not in `detected_techniques`; if that set is empty,
    /// or the preference draw fails, every chain is equally likely.
    pub fn choose_next_chain(&self, rng: &mut AgentRng) -> AttackChain {
        if rng.gen_bool(self.tuning.prefer_undetected_p) {
            let undetected: Vec<AttackChain> = AttackChain::ALL
                .into_iter()
                .filter(|c| !self.detected.contains(&c.technique()))
                .collect();
            if let Some(&chain) = rng.choose(&undetected) {
                return chain;
            }
        }
        *rng.choose(&AttackChain::ALL).unwrap_or(&self.chain)
    }

    pub fn step(&mut self, ctx: &StepContext<'_>, rng: &mut AgentRng) -> Intent {
        if self.step_index >= self.chain.steps().len() {
            let next = self.choose_next_chain(rng);
            self.start_chain(next);
        }

        let steps = self.chain.steps();
        let step = steps[self.step_index.min(steps.len() - 1)];
        self.step_index += 1;

        let technique = self.chain.technique();
        let target = self.pick_target(technique, ctx, rng);

        let mut params = BTreeMap::new();
        params.insert("chain".to_string(), self.chain.as_str().to_string());
        params.insert("step_index".to_string(), (self.step_index - 1).to_string());
        params.insert("chain_len".to_string(), steps.len().to_string());

        debug!(
            agent     = %self.profile.id,
            chain     = %self.chain,
            step      = %step,
            target    = %target,
            evasion   = self.detection_avoidance,
            "attack step",
        );

        Intent {
            actor: self.profile.id,
            action: Action::Attack(step),
            params,
            target,
            is_anomaly: true,
            bypass: Some(BypassMeta {
                technique,
                obfuscated: self.obfuscate,
                evasion:    self.detection_avoidance,
            }),
        }
    }

    pub fn react(&mut self, success: bool, rng: &mut AgentRng) {
        let technique = self.chain.technique();
        if success {
            self.successful.insert(technique);
            if self.obfuscate && rng.gen_bool(self.tuning.drop_obfuscation_p) {
                self.obfuscate = false;
            }
            return;
        }

        self.detected.insert(technique);
        self.detection_avoidance =
            (self.detection_avoidance + self.tuning.avoidance_step).min(1.0);

        if self.profile.skill == SkillLevel::Advanced && rng.gen_bool(self.tuning.switch_on_failure_p) {
            let next = self.choose_next_chain(rng);
            debug!(agent = %self.profile.id, from = %self.chain, to = %next, "switching chain after detection");
            self.start_chain(next);
        }
    }

    fn start_chain(&mut self, chain: AttackChain) {
        self.chain = chain;
        self.step_index = 0;
        self.chains_started += 1;
    }

    fn pick_target(&self, technique: BypassTechnique, ctx: &StepContext<'_>, rng: &mut AgentRng) -> String {
        let high_value = ctx.catalog.high_value_resources();
        let pool = if technique.targets_high_value() && !high_value.is_empty() {
            high_value
        } else {
            let own = ctx.catalog.resources_for(self.profile.role);
            if own.is_empty() { ctx.catalog.all_resources() } else { own }
        };
        rng.choose(pool).cloned().unwrap_or_default()
    }
}
