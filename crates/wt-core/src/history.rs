//! Incrementally refreshed per-day interval cache.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use thiserror::Error;

use crate::calendar::WorkCalendar;
use crate::day::{Day, DayError};
use crate::interval::{IntervalError, records_to_intervals, split_by_day};
use crate::log::{LogRecord, ReadError};
use crate::state::StateLabel;

/// Error type for cache refreshes and range queries.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error(transparent)]
    Day(#[from] DayError),
}

/// In-memory index of intervals grouped by workday.
///
/// Each refresh consumes only records newer than the cursor (the last record
/// seen), so the cache never re-scans the whole store. Days grow
/// monotonically and are only dropped by [`History::invalidate`], e.g. after
/// a history rewrite.
#[derive(Debug)]
pub struct History {
    calendar: WorkCalendar,
    days: BTreeMap<NaiveDate, Day>,
    dont_read_before: f64,
    last_read: Option<LogRecord>,
    last_refresh: Option<f64>,
    refresh_min_interval: f64,
}

impl History {
    #[must_use]
    pub const fn new(
        calendar: WorkCalendar,
        dont_read_before: f64,
        refresh_min_interval: f64,
    ) -> Self {
        Self {
            calendar,
            days: BTreeMap::new(),
            dont_read_before,
            last_read: None,
            last_refresh: None,
            refresh_min_interval,
        }
    }

    #[must_use]
    pub const fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    /// Whether enough time has passed since the last refresh.
    #[must_use]
    pub fn needs_refresh(&self, now: f64) -> bool {
        self.last_refresh
            .is_none_or(|last| now - last >= self.refresh_min_interval)
    }

    /// Folds records newer than the cursor into the cache.
    ///
    /// `reverse_records` must yield newest first; iteration stops at the
    /// cursor, so an up-to-date cache reads at most one record. A synthetic
    /// neutral record at `now` closes the still-open final interval; the next
    /// refresh replaces it with a longer observation. Within the minimum
    /// refresh interval this is a no-op.
    pub fn refresh<I>(&mut self, reverse_records: I, now: f64) -> Result<(), HistoryError>
    where
        I: IntoIterator<Item = Result<LogRecord, ReadError>>,
    {
        if !self.needs_refresh(now) {
            return Ok(());
        }

        let mut fresh: Vec<LogRecord> = Vec::new();
        for record in reverse_records {
            let record = record?;
            if record.timestamp <= self.dont_read_before {
                break;
            }
            if let Some(cursor) = &self.last_read {
                if record.timestamp <= cursor.timestamp {
                    break;
                }
            }
            fresh.push(record);
        }
        fresh.reverse();
        tracing::debug!(new_records = fresh.len(), "refreshing history");

        let mut records = Vec::with_capacity(fresh.len() + 2);
        if let Some(cursor) = self.last_read.clone() {
            records.push(cursor);
        }
        records.extend(fresh);
        if let Some(newest) = records.last() {
            self.last_read = Some(newest.clone());
        }

        // The log can carry a record fractionally ahead of our clock; never
        // close the open interval before it starts.
        let close_at = records.last().map_or(now, |last| last.timestamp.max(now));
        records.push(LogRecord::new(close_at, StateLabel::NEUTRAL));

        for interval in records_to_intervals(&records)? {
            for part in split_by_day(interval, &self.calendar) {
                let date = self.calendar.day_date(part.start_timestamp());
                self.days
                    .entry(date)
                    .or_insert_with(|| Day::new(date, &self.calendar))
                    .add_interval(part)?;
            }
        }
        self.last_refresh = Some(now);
        Ok(())
    }

    /// Sum of work seconds within `[start, end)`, skipping excluded dates.
    pub fn worktime_between(
        &self,
        start: f64,
        end: f64,
        exclude: &HashSet<NaiveDate>,
    ) -> Result<f64, HistoryError> {
        if end < start {
            return Err(IntervalError::EndBeforeStart { start, end }.into());
        }
        let start_date = self.calendar.day_date(start);
        let end_date = self.calendar.day_date(end);
        let mut total = 0.0;
        for (date, day) in self.days.range(start_date..=end_date) {
            if exclude.contains(date) {
                continue;
            }
            total += day.worktime_between(start, end)?;
        }
        Ok(total)
    }

    /// Cached days, oldest first.
    pub fn days(&self) -> impl Iterator<Item = &Day> {
        self.days.values()
    }

    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.get(&date)
    }

    /// The most recent cached day.
    #[must_use]
    pub fn current_day(&self) -> Option<&Day> {
        self.days.values().next_back()
    }

    /// Drops all cached state; the next refresh rebuilds from the horizon.
    pub fn invalidate(&mut self) {
        self.days.clear();
        self.last_read = None;
        self.last_refresh = None;
    }
}
