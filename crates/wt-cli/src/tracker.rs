//! Tracker facade over the store, the history cache and the accounting
//! engine.
//!
//! All store access and cache mutation happens behind one mutex, so a
//! refresh can never interleave with an append or a rewrite. Queries take
//! the lock, refresh if the rate limit allows, and read from the cache.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use chrono::Duration;

use wt_core::{
    Accounting, CalendarExceptions, DEFAULT_QUANTILE, History, LogRecord, Period, StateLabel,
    WorkCalendar, pace_positions,
};
use wt_store::{LogStore, load_days_off, load_dont_count};

use crate::config::Config;
use crate::format::{WEEKDAY_SHORT, format_duration, format_percent, render_ghost_plot};
use crate::probe::StateProbe;

/// How far back the history cache reads on its first refresh.
const HISTORY_HORIZON_SECS: f64 = 365.0 * 24.0 * 3600.0;
/// Seconds after which a missed poll marks the previous session dead.
const LAST_CHECK_STALE_SECS: f64 = 60.0;
/// Window for the instant work-ratio summary.
const INSTANT_WINDOW_SECS: f64 = 30.0 * 60.0;

struct Inner {
    store: LogStore,
    history: History,
}

/// The exposed surface for UI and CLI layers.
pub struct WorktimeTracker {
    inner: Mutex<Inner>,
    accounting: Accounting,
    calendar: WorkCalendar,
}

impl WorktimeTracker {
    pub fn open(config: &Config) -> Result<Self> {
        let calendar = config.calendar()?;
        let store = LogStore::open(&config.log_path, &config.last_check_path)
            .context("failed to open log store")?;
        let exceptions = CalendarExceptions::new(
            load_days_off(&config.days_off_path)?,
            load_dont_count(&config.dont_count_path)?,
        );
        let history = History::new(
            calendar,
            unix_now() - HISTORY_HORIZON_SECS,
            config.refresh_min_interval_secs,
        );
        let tracker = Self {
            inner: Mutex::new(Inner { store, history }),
            accounting: Accounting::new(calendar, config.target_schedule(), exceptions),
            calendar,
        };
        tracker.fix_unfinished_work_state()?;
        Ok(tracker)
    }

    /// Polls the probe once and records a transition if one happened.
    /// Returns whether the state changed.
    pub fn check_state(&self, probe: &mut dyn StateProbe) -> Result<bool> {
        let state = probe.state()?;
        let now = unix_now();
        let inner = self.lock();
        let last = inner.store.last_record()?;
        inner.store.write_last_check(now)?;
        inner
            .store
            .write_if_state_changed(&LogRecord::new(now, state))?;
        Ok(state != last.state)
    }

    /// The state the newest record reports.
    pub fn current_state(&self) -> Result<StateLabel> {
        Ok(self.lock().store.last_record()?.state)
    }

    /// Work seconds within `[start, end)`.
    pub fn get_worktime_between(&self, start: f64, end: f64) -> Result<f64> {
        let mut inner = self.lock();
        Self::refresh(&mut inner)?;
        Ok(self
            .accounting
            .worktime_between(start, end, &inner.history)?)
    }

    /// One line per elapsed weekday this week, newest first, plus the week's
    /// overtime.
    pub fn get_week_summaries(&self) -> Result<Vec<String>> {
        let now = unix_now();
        let mut inner = self.lock();
        Self::refresh(&mut inner)?;
        let history = &inner.history;

        let today = self.calendar.day_date(now);
        let current = WorkCalendar::weekday_index(today);
        let mut lines = Vec::with_capacity(current + 2);
        for index in 0..=current {
            let date = today - Duration::days(i64::try_from(current - index).unwrap_or(0));
            let worktime = self.accounting.worktime_between(
                self.calendar.day_start_of(date),
                self.calendar.day_end_of(date),
                history,
            )?;
            let target = self.accounting.target_for(date, history);
            let ratio = if target > 0.0 { worktime / target } else { 1.0 };
            lines.push(format!(
                "{}: {} ({})",
                WEEKDAY_SHORT[index],
                format_percent(ratio),
                format_duration(worktime)
            ));
        }
        lines.reverse();

        let overtime = self
            .accounting
            .period_overtime(Period::Week, now, history)?;
        lines.push(format!("Week overtime: {}", format_duration(overtime)));
        Ok(lines)
    }

    /// Work ratio over the last half hour plus today's total.
    pub fn get_instant_summary(&self) -> Result<String> {
        let now = unix_now();
        let mut inner = self.lock();
        Self::refresh(&mut inner)?;
        let history = &inner.history;

        let window_work =
            self.accounting
                .worktime_between(now - INSTANT_WINDOW_SECS, now, history)?;
        let today_work =
            self.accounting
                .worktime_between(self.calendar.day_start(now), now, history)?;
        Ok(format!(
            "{} - {}",
            format_percent(window_work / INSTANT_WINDOW_SECS),
            format_duration(today_work)
        ))
    }

    /// Race line comparing today against the historical ghost.
    ///
    /// `None` on days without a target. Days with a target but no qualifying
    /// history report [`wt_core::PaceError::EmptyHistory`].
    pub fn ghost_plot(&self, length: usize) -> Result<Option<String>> {
        let now = unix_now();
        let mut inner = self.lock();
        Self::refresh(&mut inner)?;

        let target = self
            .accounting
            .schedule()
            .for_weekday(self.calendar.weekday_index_at(now));
        let clock = WorkCalendar::to_local(now).time();
        let positions = pace_positions(&inner.history, target, clock, DEFAULT_QUANTILE)?;
        Ok(positions.map(|positions| render_ghost_plot(positions, length)))
    }

    /// Overtime over the completed days of the current period.
    pub fn overtime(&self, period: Period) -> Result<f64> {
        let now = unix_now();
        let mut inner = self.lock();
        Self::refresh(&mut inner)?;
        Ok(self
            .accounting
            .period_overtime(period, now, &inner.history)?)
    }

    /// Rewrites `[start, end]` to `new_state` and drops the cache, so the
    /// next query rebuilds from the rewritten file.
    pub fn rewrite_history(&self, start: f64, end: f64, new_state: StateLabel) -> Result<()> {
        let mut inner = self.lock();
        inner.store.rewrite(start, end, new_state)?;
        inner.history.invalidate();
        Ok(())
    }

    /// If the process died mid-work-state, everything up to the next poll
    /// would count as work. Close the record at the last time the probe
    /// actually ran.
    fn fix_unfinished_work_state(&self) -> Result<()> {
        let now = unix_now();
        let inner = self.lock();
        let last_check = inner.store.read_last_check()?;
        if now - last_check < LAST_CHECK_STALE_SECS {
            return Ok(());
        }
        let last = inner.store.last_record()?;
        if !last.state.is_work() {
            return Ok(());
        }
        tracing::info!(last_check, "closing work state left open by a dead session");
        inner.store.write_last_check(now)?;
        inner
            .store
            .write_if_state_changed(&LogRecord::new(last_check + 1.0, StateLabel::NEUTRAL))?;
        Ok(())
    }

    fn refresh(inner: &mut Inner) -> Result<()> {
        let now = unix_now();
        if inner.history.needs_refresh(now) {
            let Inner { store, history } = inner;
            history.refresh(store.read_reverse()?, now)?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}
