//! Fluent builder for synthetic populations.
//!
//! # Usage
//!
//! ```rust
//! use org_agent::PopulationBuilder;
//! use org_core::Role;
//!
//! let (profiles, rngs) = PopulationBuilder::new(/*seed=*/ 42)
//!     .with_role(Role::Sales, 3)
//!     .with_role(Role::Hr, 1)
//!     .with_adversaries(1)
//!     .build();
//!
//! assert_eq!(profiles.len(), 5);
//! assert_eq!(rngs.len(), 5);
//! assert_eq!(profiles[4].username, "adversary_000");
//! ```

use org_core::{AgentId, AgentRng, Role};

use crate::{AgentProfile, SkillLevel};

/// Builds `AgentProfile`s with contiguous ids plus one [`AgentRng`] per agent.
pub struct PopulationBuilder {
    seed:          u64,
    groups:        Vec<(Role, usize)>,
    attack_skill:  SkillLevel,
    stealth_every: usize,
}

impl PopulationBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            groups:        Vec::new(),
            attack_skill:  SkillLevel::Intermediate,
            stealth_every: 0,
        }
    }

    /// Append `count` agents of `role`.  Groups keep their insertion order.
    pub fn with_role(mut self, role: Role, count: usize) -> Self {
        if count > 0 {
            self.groups.push((role, count));
        }
        self
    }

    /// Append `count` adversarial agents.
    pub fn with_adversaries(self, count: usize) -> Self {
        self.with_role(Role::Adversary, count)
    }

    /// Skill assigned to every adversary.
    pub fn attack_skill(mut self, skill: SkillLevel) -> Self {
        self.attack_skill = skill;
        self
    }

    /// Make every `n`th adversary stealthy (0 disables).
    pub fn stealth_every(mut self, n: usize) -> Self {
        self.stealth_every = n;
        self
    }

    pub fn build(self) -> (Vec<AgentProfile>, Vec<AgentRng>) {
        let total: usize = self.groups.iter().map(|(_, n)| n).sum();
        let mut profiles = Vec::with_capacity(total);

        for (role, count) in &self.groups {
            for k in 0..*count {
                let id = AgentId(profiles.len() as u32);
                let mut profile = AgentProfile::new(id, format!("{role}_{k:03}"), *role);
                if role.is_adversarial() {
                    profile.skill = self.attack_skill;
                    profile.stealth = self.stealth_every > 0 && (k + 1) % self.stealth_every == 0;
                } else if *role == Role::Management {
                    profile.hierarchy_level = 4;
                    profile.seniority_respect = true;
                }
                profiles.push(profile);
            }
        }

        let rngs = profiles.iter().map(|p| AgentRng::new(self.seed, p.id)).collect();
        (profiles, rngs)
    }
}
