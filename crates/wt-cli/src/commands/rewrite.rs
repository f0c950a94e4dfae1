//! Retroactive history rewrite.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveTime};

use wt_core::{StateLabel, WorkCalendar};

use crate::tracker::WorktimeTracker;

pub fn run<W: Write>(
    writer: &mut W,
    tracker: &WorktimeTracker,
    start: &str,
    end: &str,
    state: &str,
    day_offset: i64,
) -> Result<()> {
    let new_state: StateLabel = state.parse()?;
    let start_ts = resolve_clock(start, day_offset)?;
    let end_ts = resolve_clock(end, day_offset)?;

    tracker.rewrite_history(start_ts, end_ts, new_state)?;
    writeln!(
        writer,
        "Rewrote {start}..{end} (day offset {day_offset}) to {new_state}"
    )?;
    Ok(())
}

/// `HH:MM` on today's date shifted by `day_offset`, as a unix timestamp.
fn resolve_clock(clock: &str, day_offset: i64) -> Result<f64> {
    let time = NaiveTime::parse_from_str(clock, "%H:%M")
        .with_context(|| format!("expected HH:MM, got {clock:?}"))?;
    let date = Local::now().date_naive() + Duration::days(day_offset);
    Ok(WorkCalendar::to_timestamp(date.and_time(time)))
}
