//! `ActivityGate`: may this agent act right now?
//!
//! # Benign policy
//!
//! | Condition                               | Outcome                          |
//! |-----------------------------------------|----------------------------------|
//! | weekend or declared holiday             | blocked (on-call roles: `on_call_p`) |
//! | outside the role's shift window         | blocked (on-call: `on_call_p`; overtime roles within `overtime_hours` after the shift: `overtime_p`) |
//! | lunch window                            | `lunch_p`                        |
//! | otherwise                               | intensity curve at the hour      |
//!
//! # Adversarial policy
//!
//! Never hard-blocked: `adversary_off_day_p` on non-working days,
//! `adversary_business_p` inside business hours and `adversary_off_hours_p`
//! outside them.
//!
//! All draws use the agent's own `AgentRng`, so for a given RNG state the
//! gate is a pure function of `(profile, time)`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use org_agent::{AgentProfile, RoleCatalog};
use org_core::{hour_of, is_weekend, AgentRng, Role, SimTime, WorkHours};

use crate::{HolidayCalendar, IntensityCurve, ScheduleError, ScheduleResult};

// ── GatePolicy ────────────────────────────────────────────────────────────────

/// Tunable constants of the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatePolicy {
    pub lunch:          WorkHours,
    pub lunch_p:        f64,

    /// Core business hours: adversary policy and the off-hours phase flag.
    pub business_hours: WorkHours,
    pub peak_hours:     Vec<WorkHours>,

    /// Roles with partial activity outside their shift and on days off.
    pub on_call_roles:  Vec<Role>,
    pub on_call_p:      f64,

    /// Roles that keep working for a while after their shift ends.
    pub overtime_roles: Vec<Role>,
    pub overtime_hours: u32,
    pub overtime_p:     f64,

    pub adversary_off_day_p:   f64,
    pub adversary_off_hours_p: f64,
    pub adversary_business_p:  f64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            lunch:          WorkHours::new(12, 13),
            lunch_p:        0.3,
            business_hours: WorkHours::new(9, 17),
            peak_hours:     vec![WorkHours::new(10, 12), WorkHours::new(14, 16)],
            on_call_roles:  vec![Role::ItAdmin],
            on_call_p:      0.05,
            overtime_roles: vec![Role::Management],
            overtime_hours: 3,
            overtime_p:     0.3,
            adversary_off_day_p:   0.1,
            adversary_off_hours_p: 0.15,
            adversary_business_p:  0.5,
        }
    }
}

impl GatePolicy {
    /// Check that every probability is in [0, 1] and every window is sane.
    pub fn validate(&self) -> ScheduleResult<()> {
        let probabilities = [
            ("lunch_p", self.lunch_p),
            ("on_call_p", self.on_call_p),
            ("overtime_p", self.overtime_p),
            ("adversary_off_day_p", self.adversary_off_day_p),
            ("adversary_off_hours_p", self.adversary_off_hours_p),
            ("adversary_business_p", self.adversary_business_p),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ScheduleError::Config(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        let windows = std::iter::once(self.lunch)
            .chain(std::iter::once(self.business_hours))
            .chain(self.peak_hours.iter().copied());
        for w in windows {
            if w.end_hour > 24 || w.start_hour > w.end_hour {
                return Err(ScheduleError::Config(format!("invalid hour window {w}")));
            }
        }
        if self.overtime_hours > 24 {
            return Err(ScheduleError::Config(format!(
                "overtime_hours must be <= 24, got {}",
                self.overtime_hours
            )));
        }
        Ok(())
    }
}

// ── TemporalPhase ─────────────────────────────────────────────────────────────

/// Calendar flags of one instant, consumed by the complexity controller.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalPhase {
    pub hour:               u32,
    pub is_holiday:         bool,
    pub is_weekend:         bool,
    pub is_lunch:           bool,
    pub is_peak:            bool,
    pub off_hours:          bool,
    pub activity_intensity: f64,
}

// ── ActivityGate ──────────────────────────────────────────────────────────────

/// Shared, read-only activity policy.
#[derive(Clone, Debug)]
pub struct ActivityGate {
    catalog:  Arc<RoleCatalog>,
    policy:   GatePolicy,
    curve:    IntensityCurve,
    holidays: HolidayCalendar,
}

impl ActivityGate {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self {
            catalog,
            policy:   GatePolicy::default(),
            curve:    IntensityCurve::default(),
            holidays: HolidayCalendar::default(),
        }
    }

    pub fn with_policy(mut self, policy: GatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_curve(mut self, curve: IntensityCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_holidays(mut self, holidays: HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn curve(&self) -> &IntensityCurve {
        &self.curve
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    /// Whether `profile` may act at `t`.
    pub fn may_act(&self, profile: &AgentProfile, t: SimTime, rng: &mut AgentRng) -> bool {
        let hour = hour_of(t);
        let working_day = self.holidays.is_working_day(t);

        if profile.is_adversarial() {
            let p = if !working_day {
                self.policy.adversary_off_day_p
            } else if self.policy.business_hours.contains(hour) {
                self.policy.adversary_business_p
            } else {
                self.policy.adversary_off_hours_p
            };
            return rng.gen_bool(p);
        }

        let role = profile.role;
        let on_call = self.policy.on_call_roles.contains(&role);

        if !working_day {
            return on_call && rng.gen_bool(self.policy.on_call_p);
        }

        let shift = self.catalog.hours(role);
        if !shift.contains(hour) {
            if on_call {
                return rng.gen_bool(self.policy.on_call_p);
            }
            let in_overtime = self.policy.overtime_roles.contains(&role)
                && hour >= shift.end_hour
                && hour < shift.end_hour.saturating_add(self.policy.overtime_hours);
            return in_overtime && rng.gen_bool(self.policy.overtime_p);
        }

        if self.policy.lunch.contains(hour) {
            return rng.gen_bool(self.policy.lunch_p);
        }

        rng.gen_bool(self.curve.at(hour))
    }

    /// Whether `t` falls inside the declared shift of `role` on a working
    /// day.  Adversaries use the business-hours window.
    pub fn in_work_hours(&self, role: Role, t: SimTime) -> bool {
        if !self.holidays.is_working_day(t) {
            return false;
        }
        let window = if role.is_adversarial() {
            self.policy.business_hours
        } else {
            self.catalog.hours(role)
        };
        window.contains_time(t)
    }

    #[inline]
    pub fn activity_intensity(&self, t: SimTime) -> f64 {
        self.curve.at(hour_of(t))
    }

    /// Calendar flags of `t`.
    pub fn phase(&self, t: SimTime) -> TemporalPhase {
        let hour = hour_of(t);
        let weekend = is_weekend(t);
        let holiday = self.holidays.is_holiday(t.date());
        TemporalPhase {
            hour,
            is_holiday:         holiday,
            is_weekend:         weekend,
            is_lunch:           self.policy.lunch.contains(hour),
            is_peak:            self.policy.peak_hours.iter().any(|w| w.contains(hour)),
            off_hours:          weekend || holiday || !self.policy.business_hours.contains(hour),
            activity_intensity: self.curve.at(hour),
        }
    }
}
