//! Per-agent cooldowns.
//!
//! After an agent acts it waits before it is considered again:
//!
//! ```text
//! intensity = max(curve(hour) × work_intensity, min_intensity)
//! cooldown  = base_wait(action) / intensity × jitter,   jitter ~ U[lo, hi]
//! ```
//!
//! Low-and-slow adversaries skip the formula and wait a uniform draw from
//! `[low_and_slow_min, low_and_slow_max]` minutes.  Every cooldown is at
//! least one tick long.
//!
//! `CooldownTable` records when each agent's cooldown expires.  Agents with
//! no entry are ready.

use serde::{Deserialize, Serialize};

#[cfg(not(feature = "fx-hash"))]
use std::collections::HashMap;
#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashMap as HashMap;

use org_core::{AgentId, AgentRng, SimTime, TimeDelta};

use crate::{ScheduleError, ScheduleResult};

// ── CooldownPolicy ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownPolicy {
    pub jitter_lo:        f64,
    pub jitter_hi:        f64,
    /// Floor of the intensity divisor, so quiet hours never divide by ~0.
    pub min_intensity:    f64,
    pub low_and_slow_min: f64,
    pub low_and_slow_max: f64,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            jitter_lo:        0.8,
            jitter_hi:        1.2,
            min_intensity:    0.05,
            low_and_slow_min: 120.0,
            low_and_slow_max: 480.0,
        }
    }
}

/// Inputs of one cooldown computation.
#[derive(Copy, Clone, Debug)]
pub struct CooldownRequest {
    /// `Action::base_wait_minutes` of the emitted action.
    pub base_wait_minutes:  f64,
    pub activity_intensity: f64,
    pub work_intensity:     f64,
    pub low_and_slow:       bool,
    /// Scheduler tick length; the floor of every cooldown.
    pub tick:               TimeDelta,
}

impl CooldownPolicy {
    pub fn validate(&self) -> ScheduleResult<()> {
        let ok = self.jitter_lo > 0.0
            && self.jitter_lo <= self.jitter_hi
            && self.jitter_hi.is_finite()
            && self.min_intensity > 0.0
            && self.min_intensity.is_finite()
            && self.low_and_slow_min >= 0.0
            && self.low_and_slow_min <= self.low_and_slow_max
            && self.low_and_slow_max.is_finite();
        if ok {
            Ok(())
        } else {
            Err(ScheduleError::Config(format!("invalid cooldown policy {self:?}")))
        }
    }

    /// The effective intensity divisor.
    #[inline]
    pub fn intensity(&self, activity_intensity: f64, work_intensity: f64) -> f64 {
        let raw = activity_intensity * work_intensity;
        if raw.is_nan() { self.min_intensity } else { raw.max(self.min_intensity) }
    }

    /// Compute a cooldown.  Always strictly positive and at least one tick.
    pub fn cooldown(&self, req: CooldownRequest, rng: &mut AgentRng) -> TimeDelta {
        let minutes = if req.low_and_slow {
            rng.jitter(self.low_and_slow_min, self.low_and_slow_max)
        } else {
            let intensity = self.intensity(req.activity_intensity, req.work_intensity);
            req.base_wait_minutes.max(0.0) / intensity * rng.jitter(self.jitter_lo, self.jitter_hi)
        };

        let floor = if req.tick > TimeDelta::zero() { req.tick } else { TimeDelta::minutes(1) };
        let millis = minutes * 60_000.0;
        if !millis.is_finite() {
            return floor;
        }
        // `as` saturates; the result is clamped to the floor below.
        TimeDelta::try_milliseconds(millis as i64)
            .unwrap_or(TimeDelta::MAX)
            .max(floor)
    }
}

// ── CooldownTable ─────────────────────────────────────────────────────────────

/// Agent → time at which its current cooldown ends.
#[derive(Default)]
pub struct CooldownTable {
    until: HashMap<AgentId, SimTime>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if `agent` has no pending cooldown at `now`.
    ///
    /// Expired entries are left in place; [`purge`](Self::purge) drops them.
    #[inline]
    pub fn is_ready(&self, agent: AgentId, now: SimTime) -> bool {
        self.until.get(&agent).is_none_or(|&until| now >= until)
    }

    /// Start a cooldown for `agent` lasting `cooldown` from `now`.
    pub fn start(&mut self, agent: AgentId, now: SimTime, cooldown: TimeDelta) {
        let until = now.checked_add_signed(cooldown).unwrap_or(SimTime::MAX);
        self.until.insert(agent, until);
    }

    pub fn expiry(&self, agent: AgentId) -> Option<SimTime> {
        self.until.get(&agent).copied()
    }

    pub fn clear(&mut self, agent: AgentId) {
        self.until.remove(&agent);
    }

    /// Drop every entry that has expired at `now`.
    pub fn purge(&mut self, now: SimTime) {
        self.until.retain(|_, until| *until > now);
    }

    /// Earliest pending expiry, if any.
    pub fn next_expiry(&self) -> Option<SimTime> {
        self.until.values().min().copied()
    }

    /// Number of agents with an entry (expired or not).
    pub fn len(&self) -> usize {
        self.until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }
}
