//! Target and overtime accounting with calendar exceptions.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::calendar::WorkCalendar;
use crate::history::{History, HistoryError};

/// Weekday worktime targets in seconds, indexed Sunday = 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSchedule {
    targets: [f64; 7],
}

impl TargetSchedule {
    #[must_use]
    pub const fn new(targets: [f64; 7]) -> Self {
        Self { targets }
    }

    #[must_use]
    pub fn for_weekday(&self, index: usize) -> f64 {
        self.targets.get(index).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn for_date(&self, date: NaiveDate) -> f64 {
        self.for_weekday(WorkCalendar::weekday_index(date))
    }
}

impl Default for TargetSchedule {
    /// Sunday through Saturday.
    fn default() -> Self {
        Self::new([
            0.0,
            6.25 * 3600.0,
            6.25 * 3600.0,
            6.25 * 3600.0,
            6.25 * 3600.0,
            5.0 * 3600.0,
            0.0,
        ])
    }
}

/// Calendar exceptions: partial days off and fully excluded dates.
#[derive(Debug, Clone, Default)]
pub struct CalendarExceptions {
    days_off: HashMap<NaiveDate, f64>,
    dont_count: HashSet<NaiveDate>,
}

impl CalendarExceptions {
    #[must_use]
    pub const fn new(days_off: HashMap<NaiveDate, f64>, dont_count: HashSet<NaiveDate>) -> Self {
        Self {
            days_off,
            dont_count,
        }
    }

    /// Discount proportion for `date`: 0 is a normal day, 1 fully off.
    #[must_use]
    pub fn off_proportion(&self, date: NaiveDate) -> f64 {
        self.days_off.get(&date).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_dont_count(&self, date: NaiveDate) -> bool {
        self.dont_count.contains(&date)
    }

    #[must_use]
    pub const fn dont_count_dates(&self) -> &HashSet<NaiveDate> {
        &self.dont_count
    }
}

/// Summary period anchored at "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
}

/// Computes targets and overtime against the history cache.
#[derive(Debug, Clone)]
pub struct Accounting {
    calendar: WorkCalendar,
    schedule: TargetSchedule,
    exceptions: CalendarExceptions,
}

impl Accounting {
    #[must_use]
    pub const fn new(
        calendar: WorkCalendar,
        schedule: TargetSchedule,
        exceptions: CalendarExceptions,
    ) -> Self {
        Self {
            calendar,
            schedule,
            exceptions,
        }
    }

    #[must_use]
    pub const fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    #[must_use]
    pub const fn schedule(&self) -> &TargetSchedule {
        &self.schedule
    }

    #[must_use]
    pub const fn exceptions(&self) -> &CalendarExceptions {
        &self.exceptions
    }

    /// Target for one date, after day-off discounts.
    ///
    /// Dates with no recorded activity at all have no target yet, rather
    /// than reading as under-target; excluded dates never have one.
    #[must_use]
    pub fn target_for(&self, date: NaiveDate, history: &History) -> f64 {
        if self.exceptions.is_dont_count(date) || history.day(date).is_none() {
            return 0.0;
        }
        self.schedule.for_date(date) * (1.0 - self.exceptions.off_proportion(date))
    }

    /// Sum of per-day targets over `[day_date(start), day_date(end))`.
    ///
    /// The end day is excluded by construction: only completed days count
    /// toward a target sum.
    #[must_use]
    pub fn target_between(&self, start: f64, end: f64, history: &History) -> f64 {
        let end_date = self.calendar.day_date(end);
        let mut date = self.calendar.day_date(start);
        let mut total = 0.0;
        while date < end_date {
            total += self.target_for(date, history);
            date = date.succ_opt().unwrap_or(end_date);
        }
        total
    }

    /// Work seconds within `[start, end)`, with excluded dates skipped.
    pub fn worktime_between(
        &self,
        start: f64,
        end: f64,
        history: &History,
    ) -> Result<f64, HistoryError> {
        history.worktime_between(start, end, self.exceptions.dont_count_dates())
    }

    /// Work time minus target over the same range.
    pub fn overtime_between(
        &self,
        start: f64,
        end: f64,
        history: &History,
    ) -> Result<f64, HistoryError> {
        Ok(self.worktime_between(start, end, history)? - self.target_between(start, end, history))
    }

    /// Overtime over the completed days of the period containing `now`.
    pub fn period_overtime(
        &self,
        period: Period,
        now: f64,
        history: &History,
    ) -> Result<f64, HistoryError> {
        let start = self.period_start(period, now);
        let today_start = self.calendar.day_start(now);
        self.overtime_between(start, today_start, history)
    }

    /// Start of the week, month or year containing `now`.
    #[must_use]
    pub fn period_start(&self, period: Period, now: f64) -> f64 {
        match period {
            Period::Week => self.calendar.week_start(now),
            Period::Month => {
                let date = self.calendar.day_date(now);
                self.calendar
                    .day_start_of(date.with_day(1).unwrap_or(date))
            }
            Period::Year => {
                let date = self.calendar.day_date(now);
                let first = date
                    .with_day(1)
                    .and_then(|d| d.with_month(1))
                    .unwrap_or(date);
                self.calendar.day_start_of(first)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogRecord, ReadError};
    use crate::state::StateLabel;

    fn ts(day: u32, hour: u32, min: u32) -> f64 {
        let date = NaiveDate::from_ymd_opt(2021, 12, day).unwrap();
        WorkCalendar::to_timestamp(date.and_hms_opt(hour, min, 0).unwrap())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 12, day).unwrap()
    }

    /// Two hours of work on Mon 6th, Tue 7th and Wed 8th each.
    fn filled_history() -> History {
        let mut records = Vec::new();
        for day in 6..=8 {
            records.push(LogRecord::new(ts(day, 9, 0), StateLabel::Work));
            records.push(LogRecord::new(ts(day, 11, 0), StateLabel::Locked));
        }
        let reversed: Vec<Result<LogRecord, ReadError>> =
            records.into_iter().rev().map(Ok).collect();
        let mut history = History::new(WorkCalendar::default(), 0.0, 0.0);
        history.refresh(reversed, ts(8, 12, 0)).unwrap();
        history
    }

    fn accounting(exceptions: CalendarExceptions) -> Accounting {
        Accounting::new(WorkCalendar::default(), TargetSchedule::default(), exceptions)
    }

    #[test]
    fn default_schedule_is_sunday_first() {
        let schedule = TargetSchedule::default();
        assert!((schedule.for_weekday(0)).abs() < 1e-6);
        assert!((schedule.for_weekday(1) - 6.25 * 3600.0).abs() < 1e-6);
        assert!((schedule.for_weekday(5) - 5.0 * 3600.0).abs() < 1e-6);
        assert!((schedule.for_weekday(6)).abs() < 1e-6);
    }

    #[test]
    fn day_off_discounts_the_target() {
        let history = filled_history();
        let days_off = [(date(7), 0.5)].into_iter().collect();
        let accounting = accounting(CalendarExceptions::new(days_off, HashSet::new()));

        assert!((accounting.target_for(date(6), &history) - 6.25 * 3600.0).abs() < 1e-6);
        assert!((accounting.target_for(date(7), &history) - 3.125 * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn dont_count_dates_have_no_target_and_no_worktime() {
        let history = filled_history();
        let dont_count: HashSet<NaiveDate> = [date(7)].into_iter().collect();
        let accounting = accounting(CalendarExceptions::new(HashMap::new(), dont_count));

        assert!(accounting.target_for(date(7), &history).abs() < 1e-6);
        let worktime = accounting
            .worktime_between(ts(6, 7, 0), ts(9, 7, 0), &history)
            .unwrap();
        assert!((worktime - 4.0 * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn unrecorded_days_have_no_target() {
        let history = filled_history();
        let accounting = accounting(CalendarExceptions::default());
        // Thursday the 9th never saw a record.
        assert!(accounting.target_for(date(9), &history).abs() < 1e-6);
    }

    #[test]
    fn target_sum_excludes_the_end_day() {
        let history = filled_history();
        let accounting = accounting(CalendarExceptions::default());

        let sum = accounting.target_between(ts(6, 9, 0), ts(8, 9, 0), &history);
        // Monday and Tuesday only; Wednesday is the (excluded) end day.
        assert!((sum - 2.0 * 6.25 * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn overtime_is_worktime_minus_target() {
        let history = filled_history();
        let accounting = accounting(CalendarExceptions::default());

        let overtime = accounting
            .overtime_between(ts(6, 7, 0), ts(8, 7, 0), &history)
            .unwrap();
        // Two 2-hour days against two 6.25-hour targets.
        assert!((overtime - (4.0 - 12.5) * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn week_overtime_runs_from_sunday_to_today_start() {
        let history = filled_history();
        let accounting = accounting(CalendarExceptions::default());

        let overtime = accounting
            .period_overtime(Period::Week, ts(8, 12, 0), &history)
            .unwrap();
        // Monday and Tuesday completed: 4h done against 12.5h targeted.
        assert!((overtime - (4.0 - 12.5) * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn period_starts_snap_to_calendar_boundaries() {
        let accounting = accounting(CalendarExceptions::default());
        let now = ts(8, 12, 0);

        let week = accounting.period_start(Period::Week, now);
        assert!((week - ts(5, 7, 0)).abs() < 1e-6);

        let month = accounting.period_start(Period::Month, now);
        assert!((month - ts(1, 7, 0)).abs() < 1e-6);

        let year = accounting.period_start(Period::Year, now);
        let jan_first = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert!((year - WorkCalendar::default().day_start_of(jan_first)).abs() < 1e-6);
    }
}
