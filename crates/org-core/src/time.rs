//! Simulation time model.
//!
//! # Design
//!
//! Simulated time is a calendar timestamp (`SimTime`, a
//! `chrono::NaiveDateTime`) because every policy in the simulator is phrased
//! in calendar terms: weekdays, holidays, the lunch hour, a role's shift.
//!
//! The mapping from real time is held in `VirtualClock`:
//!
//!   sim_time = sim_anchor + real_elapsed * acceleration
//!
//! The clock stores only its two anchors and the factor, so it is shared
//! read-only (`Arc<VirtualClock>`) by every agent worker without locking.
//!
//! Stepped drivers and tests use `SteppedClock` instead, which only moves when
//! `advance` is called.  Both implement [`SimClock`].

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};

use crate::{OrgError, OrgResult};

/// A point in simulated time (local, timezone-free).
pub type SimTime = NaiveDateTime;

/// Hour-of-day (0..=23) of a simulated timestamp.
#[inline]
pub fn hour_of(t: SimTime) -> u32 {
    t.hour()
}

/// `true` on Saturdays and Sundays.
#[inline]
pub fn is_weekend(t: SimTime) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// A source of simulated time.
pub trait SimClock: Send + Sync {
    /// The current simulated time.  Never decreases between calls.
    fn now(&self) -> SimTime;

    /// Move the clock forward by `by`.
    ///
    /// Clocks driven by real time ignore this; the default is a no-op.
    fn advance(&mut self, _by: TimeDelta) {}
}

// ── VirtualClock ──────────────────────────────────────────────────────────────

/// Maps elapsed real time to accelerated simulated time.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    sim_anchor:   SimTime,
    real_anchor:  Instant,
    acceleration: f64,
}

impl VirtualClock {
    /// Start a clock now, at `sim_anchor`, running `acceleration` times faster
    /// than real time.
    ///
    /// # Errors
    ///
    /// `OrgError::Config` if `acceleration` is not finite and positive.
    pub fn new(sim_anchor: SimTime, acceleration: f64) -> OrgResult<Self> {
        if !acceleration.is_finite() || acceleration <= 0.0 {
            return Err(OrgError::Config(format!(
                "acceleration must be finite and > 0, got {acceleration}"
            )));
        }
        Ok(Self { sim_anchor, real_anchor: Instant::now(), acceleration })
    }

    pub fn sim_anchor(&self) -> SimTime {
        self.sim_anchor
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Simulated time after `real_elapsed` of wall time since the anchor.
    ///
    /// Millisecond resolution.  Saturates at `NaiveDateTime::MAX` rather than
    /// overflowing.
    pub fn at(&self, real_elapsed: Duration) -> SimTime {
        // `as` saturates, so the product can never wrap negative.
        let sim_ms = (real_elapsed.as_secs_f64() * self.acceleration * 1_000.0) as i64;
        TimeDelta::try_milliseconds(sim_ms)
            .and_then(|d| self.sim_anchor.checked_add_signed(d))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Real (wall-clock) time needed for `sim` of simulated time to pass.
    ///
    /// Negative deltas map to zero.
    pub fn real_duration(&self, sim: TimeDelta) -> Duration {
        let sim_secs = sim.num_milliseconds().max(0) as f64 / 1_000.0;
        Duration::try_from_secs_f64(sim_secs / self.acceleration).unwrap_or(Duration::MAX)
    }
}

impl SimClock for VirtualClock {
    fn now(&self) -> SimTime {
        self.at(self.real_anchor.elapsed())
    }
}

// ── SteppedClock ──────────────────────────────────────────────────────────────

/// A manually advanced clock for stepped drivers and tests.
#[derive(Clone, Debug)]
pub struct SteppedClock {
    current: SimTime,
}

impl SteppedClock {
    pub fn new(start: SimTime) -> Self {
        Self { current: start }
    }
}

impl SimClock for SteppedClock {
    fn now(&self) -> SimTime {
        self.current
    }

    /// Negative deltas are ignored so the clock stays monotonic.
    fn advance(&mut self, by: TimeDelta) {
        if by > TimeDelta::zero() {
            self.current = self.current.checked_add_signed(by).unwrap_or(NaiveDateTime::MAX);
        }
    }
}

impl fmt::Display for SteppedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current.format("%Y-%m-%d %H:%M"), self.current.weekday())
    }
}

// ── WorkHours ─────────────────────────────────────────────────────────────────

/// A daily `[start_hour, end_hour)` window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkHours {
    pub start_hour: u32,
    pub end_hour:   u32,
}

impl WorkHours {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self { start_hour, end_hour }
    }

    /// `true` if `hour` falls inside the half-open window.
    #[inline]
    pub fn contains(self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }

    #[inline]
    pub fn contains_time(self, t: SimTime) -> bool {
        self.contains(t.hour())
    }

    /// Number of hours in the window (0 for an empty or inverted window).
    pub fn len(self) -> u32 {
        self.end_hour.saturating_sub(self.start_hour)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for WorkHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:02}:00, {:02}:00)", self.start_hour, self.end_hour)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically loaded from a JSON file by the application crate (enable the
/// `serde` feature) and passed to the scheduler builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulated time at the start of the run.
    pub start: SimTime,

    /// How many simulated seconds pass per real second.
    pub acceleration: f64,

    /// Simulated minutes covered by one scheduler tick.
    pub tick_minutes: u32,

    /// Ticks a stepped driver runs before stopping.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical stepped runs.
    pub seed: u64,
}

impl SimConfig {
    /// Length of one tick as a simulated duration.
    pub fn tick_delta(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.tick_minutes))
    }

    /// Simulated time at which a stepped run of `total_ticks` ends.
    pub fn end_time(&self) -> SimTime {
        let minutes = self.total_ticks.saturating_mul(u64::from(self.tick_minutes));
        i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|d| self.start.checked_add_signed(d))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Construct a `SteppedClock` positioned at `start`.
    pub fn make_stepped_clock(&self) -> SteppedClock {
        SteppedClock::new(self.start)
    }

    /// Construct a `VirtualClock` anchored at `start`, running from now.
    pub fn make_virtual_clock(&self) -> OrgResult<VirtualClock> {
        VirtualClock::new(self.start, self.acceleration)
    }
}

impl Default for SimConfig {
    /// Monday 2024-01-08 08:00, one simulated minute per real second, 5-minute
    /// ticks for one simulated week.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 8)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap_or_default();
        Self {
            start,
            acceleration: 60.0,
            tick_minutes: 5,
            total_ticks:  7 * 24 * 12,
            seed:         42,
        }
    }
}
