//! Polling loop recording state transitions.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::probe::StateProbe;
use crate::tracker::WorktimeTracker;

/// Granularity at which a sleeping loop notices the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Polls the probe every `interval` until `shutdown` flips.
///
/// Probe failures are logged and the tick skipped; the next poll retries.
/// Each tick repaints one status line in place, the way the interactive
/// tracker has always displayed itself.
pub fn run(
    tracker: &WorktimeTracker,
    probe: &mut dyn StateProbe,
    interval: Duration,
    shutdown: &AtomicBool,
    max_polls: Option<u64>,
) -> Result<()> {
    let mut polls: u64 = 0;
    while !shutdown.load(Ordering::SeqCst) {
        match tracker.check_state(probe) {
            Ok(true) => {
                tracing::info!(state = %tracker.current_state()?, "state changed");
            }
            Ok(false) => {}
            Err(err) => tracing::warn!(error = %err, "probe failed, skipping tick"),
        }

        let mut parts = Vec::new();
        if let Ok(Some(ghost)) = tracker.ghost_plot(50) {
            parts.push(ghost);
        }
        parts.push(tracker.get_instant_summary()?);
        parts.extend(tracker.get_week_summaries()?);
        print!("{}\r", parts.join(" - "));
        io::stdout().flush()?;

        polls += 1;
        if max_polls.is_some_and(|max| polls >= max) {
            break;
        }
        sleep_interruptible(interval, shutdown);
    }
    println!();
    tracing::info!("watch loop stopped");
    Ok(())
}

/// Sleeps for `interval`, waking early when the shutdown flag flips.
fn sleep_interruptible(interval: Duration, shutdown: &AtomicBool) {
    let mut remaining = interval;
    while remaining > Duration::ZERO && !shutdown.load(Ordering::SeqCst) {
        let step = remaining.min(SHUTDOWN_POLL);
        thread::sleep(step);
        remaining -= step;
    }
}
