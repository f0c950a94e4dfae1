//! Per-workday interval buckets.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::calendar::WorkCalendar;
use crate::interval::{Interval, IntervalError, intervals_between};

/// Recorded work above which a day counts as a work day.
const WORK_DAY_THRESHOLD_SECS: f64 = 4.0 * 3600.0;

/// Error type for interval placement within a day.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DayError {
    #[error("interval {interval_start}..{interval_end} outside day {date}")]
    OutOfBounds {
        date: NaiveDate,
        interval_start: f64,
        interval_end: f64,
    },

    #[error("interval starting at {interval_start} overlaps previous interval ending at {previous_end}")]
    Overlap {
        interval_start: f64,
        previous_end: f64,
    },
}

/// One workday's ordered, non-overlapping intervals.
#[derive(Debug, Clone)]
pub struct Day {
    date: NaiveDate,
    day_start: f64,
    day_end: f64,
    intervals: Vec<Interval>,
}

impl Day {
    #[must_use]
    pub fn new(date: NaiveDate, calendar: &WorkCalendar) -> Self {
        Self {
            date,
            day_start: calendar.day_start_of(date),
            day_end: calendar.day_end_of(date),
            intervals: Vec::new(),
        }
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub const fn day_start(&self) -> f64 {
        self.day_start
    }

    #[must_use]
    pub const fn day_end(&self) -> f64 {
        self.day_end
    }

    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Appends an interval, keeping the bucket ordered and non-overlapping.
    ///
    /// An interval that starts exactly where the previous one started
    /// replaces it: the previous one was a synthetic closer from an earlier
    /// refresh, now superseded by a longer observation.
    #[expect(
        clippy::float_cmp,
        reason = "synthetic closers reuse the cursor timestamp bit-for-bit"
    )]
    pub fn add_interval(&mut self, interval: Interval) -> Result<(), DayError> {
        if interval.start_timestamp() < self.day_start || self.day_end < interval.end_timestamp() {
            return Err(DayError::OutOfBounds {
                date: self.date,
                interval_start: interval.start_timestamp(),
                interval_end: interval.end_timestamp(),
            });
        }
        if let Some(last) = self.intervals.last() {
            if last.start_timestamp() == interval.start_timestamp() {
                self.intervals.pop();
            }
        }
        if let Some(last) = self.intervals.last() {
            if interval.start_timestamp() < last.end_timestamp() {
                return Err(DayError::Overlap {
                    interval_start: interval.start_timestamp(),
                    previous_end: last.end_timestamp(),
                });
            }
        }
        self.intervals.push(interval);
        Ok(())
    }

    /// Total work seconds recorded for this day.
    #[must_use]
    pub fn worktime(&self) -> f64 {
        self.intervals.iter().map(Interval::work_time).sum()
    }

    /// Work seconds within `[start, end)`.
    pub fn worktime_between(&self, start: f64, end: f64) -> Result<f64, IntervalError> {
        Ok(intervals_between(&self.intervals, start, end)?
            .iter()
            .map(Interval::work_time)
            .sum())
    }

    /// Cumulative work seconds from the day start up to `clock` on this day.
    pub fn worktime_at(
        &self,
        clock: NaiveTime,
        calendar: &WorkCalendar,
    ) -> Result<f64, IntervalError> {
        let until = calendar.clock_on(self.date, clock);
        self.worktime_between(self.day_start, until)
    }

    /// Monday through Friday.
    #[must_use]
    pub fn is_week_day(&self) -> bool {
        (1..=5).contains(&WorkCalendar::weekday_index(self.date))
    }

    /// A week day with a meaningful amount of recorded work.
    #[must_use]
    pub fn is_work_day(&self) -> bool {
        self.is_week_day() && self.worktime() > WORK_DAY_THRESHOLD_SECS
    }
}
