//! Status command: current state plus this week's summaries.

use std::io::Write;

use anyhow::Result;

use crate::tracker::WorktimeTracker;

pub fn run<W: Write>(writer: &mut W, tracker: &WorktimeTracker) -> Result<()> {
    writeln!(writer, "State: {}", tracker.current_state()?)?;
    writeln!(writer, "Now: {}", tracker.get_instant_summary()?)?;
    for line in tracker.get_week_summaries()? {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
