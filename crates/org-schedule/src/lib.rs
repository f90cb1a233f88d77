//! `org-schedule`: when agents may act and how long they wait.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`gate`]       | `ActivityGate`, `GatePolicy`, `TemporalPhase`              |
//! | [`intensity`]  | `IntensityCurve` (24 hourly values)                        |
//! | [`calendar`]   | `HolidayCalendar`, holiday CSV loader                      |
//! | [`cooldown`]   | `CooldownPolicy`, `CooldownRequest`, `CooldownTable`       |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                       |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                               |
//! |-----------|------------------------------------------------------|
//! | `fx-hash` | `CooldownTable` uses `FxHashMap` instead of SipHash. |

pub mod calendar;
pub mod cooldown;
pub mod error;
pub mod gate;
pub mod intensity;


pub use calendar::{load_holidays_csv, load_holidays_reader, HolidayCalendar};
pub use cooldown::{CooldownPolicy, CooldownRequest, CooldownTable};
pub use error::{ScheduleError, ScheduleResult};
pub use gate::{ActivityGate, GatePolicy, TemporalPhase};
pub use intensity::IntensityCurve;
