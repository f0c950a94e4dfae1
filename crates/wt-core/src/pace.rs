//! Historical pace estimation.
//!
//! Compares today's accumulated worktime against the same clock time on
//! historical work days, so a display layer can render a race against a
//! "ghost" of past performance.

use chrono::NaiveTime;
use thiserror::Error;

use crate::calendar::WorkCalendar;
use crate::day::Day;
use crate::history::History;
use crate::interval::IntervalError;

/// Default quantile: a good-but-not-best historical day.
pub const DEFAULT_QUANTILE: f64 = 0.75;

/// Error type for pace queries.
#[derive(Debug, Error)]
pub enum PaceError {
    /// No historical day qualifies as a work day.
    #[error("no qualifying work days in history")]
    EmptyHistory,

    #[error(transparent)]
    Interval(#[from] IntervalError),
}

/// Normalized race positions, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacePositions {
    pub you: f64,
    pub ghost: f64,
}

/// Cumulative worktime at `clock` for every qualifying work day.
pub fn worktime_values_at<'a>(
    days: impl IntoIterator<Item = &'a Day>,
    clock: NaiveTime,
    calendar: &WorkCalendar,
) -> Result<Vec<f64>, PaceError> {
    let mut values = Vec::new();
    for day in days {
        if day.is_work_day() {
            values.push(day.worktime_at(clock, calendar)?);
        }
    }
    Ok(values)
}

/// The `q`-th quantile of worktime-by-`clock` across qualifying days.
pub fn quantile_worktime_at<'a>(
    days: impl IntoIterator<Item = &'a Day>,
    clock: NaiveTime,
    q: f64,
    calendar: &WorkCalendar,
) -> Result<f64, PaceError> {
    let mut values = worktime_values_at(days, clock, calendar)?;
    if values.is_empty() {
        return Err(PaceError::EmptyHistory);
    }
    values.sort_by(f64::total_cmp);
    Ok(quantile_of_sorted(&values, q))
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "rank fits comfortably in both domains for day counts"
)]
fn quantile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    let fraction = rank - rank.floor();
    sorted[low] + (sorted[high] - sorted[low]) * fraction
}

/// Today's position and the historical ghost's, normalized against `target`.
///
/// Returns `None` when the target is 0: there is no race to run on a day
/// without a target.
pub fn pace_positions(
    history: &History,
    target: f64,
    clock: NaiveTime,
    q: f64,
) -> Result<Option<PacePositions>, PaceError> {
    if target <= 0.0 {
        return Ok(None);
    }
    let calendar = *history.calendar();
    let ghost_worktime = quantile_worktime_at(history.days(), clock, q, &calendar)?;
    let today_worktime = history.current_day().map_or(0.0, Day::worktime);
    Ok(Some(PacePositions {
        you: (today_worktime / target).min(1.0),
        ghost: (ghost_worktime / target).min(1.0),
    }))
}
