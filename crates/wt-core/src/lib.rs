//! Core domain logic for the worktime tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Records: `(timestamp, state)` observations and their wire format
//! - Intervals: contiguous spans of constant state derived from records
//! - History: the incrementally refreshed per-day cache
//! - Accounting: targets, day-off discounts and overtime
//! - Pace: quantile comparison against historical same-time-of-day worktime
//!
//! All I/O lives in `wt-store`; everything here is deterministic and takes
//! "now" as an argument.

pub mod accounting;
pub mod calendar;
pub mod day;
pub mod history;
pub mod interval;
pub mod log;
pub mod pace;
pub mod state;

pub use accounting::{Accounting, CalendarExceptions, Period, TargetSchedule};
pub use calendar::{InvalidDayStartHour, WorkCalendar};
pub use day::{Day, DayError};
pub use history::{History, HistoryError};
pub use interval::{
    Interval, IntervalError, intervals_between, records_to_intervals, split_by_day,
};
pub use log::{LogRecord, ParseRecordError, ReadError};
pub use pace::{
    DEFAULT_QUANTILE, PaceError, PacePositions, pace_positions, quantile_worktime_at,
    worktime_values_at,
};
pub use state::{StateLabel, UnknownStateLabel};
