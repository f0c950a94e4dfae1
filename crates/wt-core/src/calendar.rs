//! Workday calendar arithmetic.
//!
//! The workday begins at a configured clock hour rather than midnight, so a
//! session at 2am belongs to the previous calendar date. All conversions
//! between unix seconds and wall-clock time go through this type.

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// Error type for out-of-range day start hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("day start hour must be below 24, got {0}")]
pub struct InvalidDayStartHour(pub u32);

/// Calendar for a workday that starts at a fixed clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkCalendar {
    day_start_hour: u32,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            day_start_hour: Self::DEFAULT_DAY_START_HOUR,
        }
    }
}

impl WorkCalendar {
    pub const DEFAULT_DAY_START_HOUR: u32 = 7;

    pub const fn new(day_start_hour: u32) -> Result<Self, InvalidDayStartHour> {
        if day_start_hour >= 24 {
            return Err(InvalidDayStartHour(day_start_hour));
        }
        Ok(Self { day_start_hour })
    }

    #[must_use]
    pub const fn day_start_hour(&self) -> u32 {
        self.day_start_hour
    }

    /// Local wall-clock representation of a unix timestamp.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fractional part is in [0, 1) by construction"
    )]
    pub fn to_local(timestamp: f64) -> NaiveDateTime {
        let secs = timestamp.floor() as i64;
        let nanos = ((timestamp - timestamp.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs, nanos)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .with_timezone(&Local)
            .naive_local()
    }

    /// Unix timestamp of a local wall-clock time.
    ///
    /// A DST fold resolves to the earlier instant; a time skipped by a DST
    /// gap falls forward one hour.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "microsecond precision is ample for poll-scale timestamps"
    )]
    pub fn to_timestamp(datetime: NaiveDateTime) -> f64 {
        let resolved = match Local.from_local_datetime(&datetime) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
            LocalResult::None => {
                let shifted = datetime + Duration::hours(1);
                match Local.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
                    LocalResult::None => Utc.from_utc_datetime(&datetime).with_timezone(&Local),
                }
            }
        };
        resolved.timestamp_micros() as f64 / 1e6
    }

    /// The shifted calendar date owning `timestamp`: clock times before the
    /// start hour belong to the previous date.
    #[must_use]
    pub fn day_date(&self, timestamp: f64) -> NaiveDate {
        (Self::to_local(timestamp) - Duration::hours(i64::from(self.day_start_hour))).date()
    }

    /// Start of the workday labeled `date`.
    #[must_use]
    pub fn day_start_of(&self, date: NaiveDate) -> f64 {
        Self::to_timestamp(date.and_time(self.start_time()))
    }

    /// End of the workday labeled `date`, i.e. the next day's start.
    #[must_use]
    pub fn day_end_of(&self, date: NaiveDate) -> f64 {
        self.day_start_of(date.succ_opt().unwrap_or(date))
    }

    /// Start of the workday containing `timestamp`.
    #[must_use]
    pub fn day_start(&self, timestamp: f64) -> f64 {
        self.day_start_of(self.day_date(timestamp))
    }

    /// End of the workday containing `timestamp`.
    #[must_use]
    pub fn day_end(&self, timestamp: f64) -> f64 {
        self.day_end_of(self.day_date(timestamp))
    }

    /// Weekday index with Sunday = 0.
    #[must_use]
    pub fn weekday_index(date: NaiveDate) -> usize {
        date.weekday().num_days_from_sunday() as usize
    }

    /// Weekday index of the workday containing `timestamp`.
    #[must_use]
    pub fn weekday_index_at(&self, timestamp: f64) -> usize {
        Self::weekday_index(self.day_date(timestamp))
    }

    /// Start of the week (the Sunday workday start) containing `timestamp`.
    #[must_use]
    pub fn week_start(&self, timestamp: f64) -> f64 {
        let date = self.day_date(timestamp);
        let back = i64::try_from(Self::weekday_index(date)).unwrap_or(0);
        self.day_start_of(date - Duration::days(back))
    }

    /// Timestamp of `clock` within the workday labeled `date`. Clock times at
    /// or before the start hour land on the next calendar date.
    #[must_use]
    pub fn clock_on(&self, date: NaiveDate, clock: NaiveTime) -> f64 {
        let mut datetime = date.and_time(clock);
        if clock <= self.start_time() {
            datetime += Duration::days(1);
        }
        Self::to_timestamp(datetime)
    }

    fn start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.day_start_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}
