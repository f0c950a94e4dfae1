//! Intervals of constant state derived from adjacent log records.

use thiserror::Error;

use crate::calendar::WorkCalendar;
use crate::log::LogRecord;
use crate::state::StateLabel;

/// Longest span a single interval may cover. Anything longer means the log
/// is corrupt or missing data.
const MAX_INTERVAL_SECS: f64 = 365.0 * 24.0 * 3600.0;

/// Error type for interval construction and clipping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntervalError {
    #[error("interval ends before it starts: {start} > {end}")]
    EndBeforeStart { start: f64, end: f64 },

    #[error("interval longer than one year: {start}..{end}")]
    TooLong { start: f64, end: f64 },

    #[error("split point {at} outside interval {start}..{end}")]
    SplitOutOfBounds { at: f64, start: f64, end: f64 },
}

/// A half-open span of constant state between two log records.
///
/// The state is the starting record's state: a record marks a transition
/// into its state, which lasts until the next record.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    start: LogRecord,
    end: LogRecord,
}

impl Interval {
    pub fn new(start: LogRecord, end: LogRecord) -> Result<Self, IntervalError> {
        if end.timestamp < start.timestamp {
            return Err(IntervalError::EndBeforeStart {
                start: start.timestamp,
                end: end.timestamp,
            });
        }
        if end.timestamp - start.timestamp > MAX_INTERVAL_SECS {
            return Err(IntervalError::TooLong {
                start: start.timestamp,
                end: end.timestamp,
            });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn state(&self) -> StateLabel {
        self.start.state
    }

    #[must_use]
    pub const fn start_timestamp(&self) -> f64 {
        self.start.timestamp
    }

    #[must_use]
    pub const fn end_timestamp(&self) -> f64 {
        self.end.timestamp
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end.timestamp - self.start.timestamp
    }

    #[must_use]
    pub fn is_work(&self) -> bool {
        self.state().is_work()
    }

    /// Duration if this is a work interval, otherwise 0.
    #[must_use]
    pub fn work_time(&self) -> f64 {
        if self.is_work() { self.duration() } else { 0.0 }
    }

    /// Splits at `at`, which must lie within the interval. Both halves carry
    /// this interval's state via a synthetic boundary record.
    pub fn split(&self, at: f64) -> Result<(Self, Self), IntervalError> {
        if at < self.start.timestamp || self.end.timestamp < at {
            return Err(IntervalError::SplitOutOfBounds {
                at,
                start: self.start.timestamp,
                end: self.end.timestamp,
            });
        }
        let boundary = LogRecord::new(at, self.state());
        Ok((
            Self::new(self.start.clone(), boundary.clone())?,
            Self::new(boundary, self.end.clone())?,
        ))
    }
}

/// Pairs adjacent records into intervals: N records yield N-1 intervals.
///
/// A caller closing an open tail must append a synthetic "now" record first.
pub fn records_to_intervals(records: &[LogRecord]) -> Result<Vec<Interval>, IntervalError> {
    records
        .windows(2)
        .map(|pair| Interval::new(pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Splits an interval at every workday boundary it crosses.
///
/// Iterative so that a multi-year gap in the log cannot overflow the stack.
#[must_use]
pub fn split_by_day(interval: Interval, calendar: &WorkCalendar) -> Vec<Interval> {
    let mut parts = Vec::new();
    let mut rest = interval;
    loop {
        let day_end = calendar.day_end(rest.start_timestamp());
        if rest.end_timestamp() < day_end {
            parts.push(rest);
            return parts;
        }
        match rest.split(day_end) {
            Ok((head, tail)) => {
                parts.push(head);
                rest = tail;
            }
            // The boundary always lies within `rest`; keep the remainder
            // whole if the calendar ever disagrees.
            Err(_) => {
                parts.push(rest);
                return parts;
            }
        }
    }
}

/// Clips a sequence of intervals to `[start, end)`.
///
/// Intervals fully outside the window are dropped, including ones that only
/// touch a boundary; partially overlapping intervals are truncated. Clipping
/// an already-clipped set with the same bounds returns it unchanged.
pub fn intervals_between(
    intervals: &[Interval],
    start: f64,
    end: f64,
) -> Result<Vec<Interval>, IntervalError> {
    if end < start {
        return Err(IntervalError::EndBeforeStart { start, end });
    }
    let mut clipped = Vec::new();
    for interval in intervals {
        if interval.end_timestamp() <= start || end <= interval.start_timestamp() {
            continue;
        }
        let mut interval = interval.clone();
        if interval.start_timestamp() < start {
            interval = interval.split(start)?.1;
        }
        if end < interval.end_timestamp() {
            interval = interval.split(end)?.0;
        }
        clipped.push(interval);
    }
    Ok(clipped)
}
