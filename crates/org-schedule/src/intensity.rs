//! Hour-of-day activity intensity.

use serde::{Deserialize, Serialize};

use crate::{ScheduleError, ScheduleResult};

/// Relative activity level for each hour of the day, in [0, 1].
///
/// Feeds the gate's pass probability inside work hours and the cooldown
/// divisor.  The default curve peaks at 1.0 across 09:00–10:59, dips over
/// lunch, and tails off through the evening.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntensityCurve {
    hourly: [f64; 24],
}

impl IntensityCurve {
    /// # Errors
    ///
    /// `ScheduleError::Config` if any value is non-finite or outside [0, 1].
    pub fn new(hourly: [f64; 24]) -> ScheduleResult<Self> {
        if let Some((hour, v)) = hourly
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || !(0.0..=1.0).contains(*v))
        {
            return Err(ScheduleError::Config(format!(
                "intensity for hour {hour} must be in [0, 1], got {v}"
            )));
        }
        Ok(Self { hourly })
    }

    /// A curve with the same value at every hour.
    pub fn flat(value: f64) -> ScheduleResult<Self> {
        Self::new([value; 24])
    }

    /// Intensity at `hour` (taken modulo 24).
    #[inline]
    pub fn at(&self, hour: u32) -> f64 {
        self.hourly[(hour % 24) as usize]
    }

    pub fn hourly(&self) -> &[f64; 24] {
        &self.hourly
    }

    /// Hour with the highest intensity; the earliest wins a tie.
    pub fn peak_hour(&self) -> u32 {
        let mut best = 0;
        for (hour, &v) in self.hourly.iter().enumerate() {
            if v > self.hourly[best] {
                best = hour;
            }
        }
        best as u32
    }
}

impl Default for IntensityCurve {
    fn default() -> Self {
        Self {
            hourly: [
                0.05, 0.05, 0.05, 0.05, 0.05, 0.05, // 00-05
                0.10, 0.30, 0.70,                   // 06-08
                1.00, 1.00, 0.95,                   // 09-11
                0.60, 0.80,                         // 12-13
                0.95, 0.90, 0.80,                   // 14-16
                0.50, 0.30, 0.20,                   // 17-19
                0.10, 0.10, 0.10, 0.10,             // 20-23
            ],
        }
    }
}
