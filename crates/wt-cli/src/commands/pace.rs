//! Pace command: today's race against the historical ghost.

use std::io::Write;

use anyhow::Result;

use crate::tracker::WorktimeTracker;

const TRACK_LENGTH: usize = 60;

pub fn run<W: Write>(writer: &mut W, tracker: &WorktimeTracker) -> Result<()> {
    match tracker.ghost_plot(TRACK_LENGTH)? {
        Some(plot) => writeln!(writer, "{plot}")?,
        None => writeln!(writer, "No target today; nothing to race.")?,
    }
    Ok(())
}
