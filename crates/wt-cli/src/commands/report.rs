//! Overtime report over week, month or year periods.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use wt_core::Period;

use crate::format::format_duration;
use crate::tracker::WorktimeTracker;

/// JSON payload for `--json`.
#[derive(Debug, Serialize)]
struct ReportPayload<'a> {
    period: &'a str,
    overtime_secs: f64,
    overtime: String,
}

pub fn run<W: Write>(
    writer: &mut W,
    tracker: &WorktimeTracker,
    period: Period,
    json: bool,
) -> Result<()> {
    let overtime = tracker.overtime(period)?;
    let period_name = match period {
        Period::Week => "week",
        Period::Month => "month",
        Period::Year => "year",
    };

    if json {
        serde_json::to_writer_pretty(
            &mut *writer,
            &ReportPayload {
                period: period_name,
                overtime_secs: overtime,
                overtime: format_duration(overtime),
            },
        )?;
        writeln!(writer)?;
    } else {
        writeln!(
            writer,
            "Overtime this {period_name}: {}",
            format_duration(overtime)
        )?;
    }
    Ok(())
}
