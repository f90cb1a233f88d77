//! Non-working days.
//!
//! # CSV format
//!
//! ```csv
//! date
//! 2024-01-01
//! 2024-07-04
//! ```

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use org_core::{is_weekend, NaiveDate, SimTime};

use crate::{ScheduleError, ScheduleResult};

/// Declared holidays.  Weekends are handled separately and are always
/// non-working for benign agents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self { dates: dates.into_iter().collect() }
    }

    /// Add New Year's Day, Independence Day and Christmas Day for `year`.
    pub fn with_fixed_holidays(mut self, year: i32) -> Self {
        for (month, day) in [(1, 1), (7, 4), (12, 25)] {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.dates.insert(date);
            }
        }
        self
    }

    pub fn insert(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    #[inline]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// `false` on weekends and declared holidays.
    #[inline]
    pub fn is_working_day(&self, t: SimTime) -> bool {
        !is_weekend(t) && !self.is_holiday(t.date())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Deserialize)]
struct HolidayRecord {
    date: String,
}

/// Load a holiday calendar from a CSV file.  See the module docs for the format.
pub fn load_holidays_csv(path: &Path) -> ScheduleResult<HolidayCalendar> {
    let file = std::fs::File::open(path)?;
    load_holidays_reader(file)
}

/// Like [`load_holidays_csv`] but accepts any `Read` source.
pub fn load_holidays_reader<R: Read>(reader: R) -> ScheduleResult<HolidayCalendar> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut calendar = HolidayCalendar::new();
    for result in csv_reader.deserialize::<HolidayRecord>() {
        let row = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .map_err(|e| ScheduleError::Parse(format!("bad date {:?}: {e}", row.date)))?;
        calendar.insert(date);
    }
    Ok(calendar)
}
