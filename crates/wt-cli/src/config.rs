//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use wt_core::{InvalidDayStartHour, TargetSchedule, WorkCalendar};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the log file.
    pub log_path: PathBuf,
    /// Path to the last-check sidecar file.
    pub last_check_path: PathBuf,
    /// Path to the days-off file.
    pub days_off_path: PathBuf,
    /// Path to the don't-count-days file.
    pub dont_count_path: PathBuf,
    /// Clock hour at which a workday begins.
    pub day_start_hour: u32,
    /// Seconds between probe polls.
    pub poll_interval_secs: u64,
    /// Minimum seconds between history refreshes.
    pub refresh_min_interval_secs: f64,
    /// Weekday targets in hours, Sunday first.
    pub targets_hours: [f64; 7],
    /// Command whose stdout names the current state.
    pub probe_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_path: data_dir.join("logs.tsv"),
            last_check_path: data_dir.join("last_check.txt"),
            days_off_path: data_dir.join("days_off.txt"),
            dont_count_path: data_dir.join("dont_count_days.txt"),
            day_start_hour: WorkCalendar::DEFAULT_DAY_START_HOUR,
            poll_interval_secs: 30,
            refresh_min_interval_secs: 1.0,
            targets_hours: [0.0, 6.25, 6.25, 6.25, 6.25, 5.0, 0.0],
            probe_command: None,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WT_*)
        figment = figment.merge(Env::prefixed("WT_"));

        figment.extract()
    }

    /// The weekday schedule in seconds.
    #[must_use]
    pub fn target_schedule(&self) -> TargetSchedule {
        TargetSchedule::new(self.targets_hours.map(|hours| hours * 3600.0))
    }

    pub fn calendar(&self) -> Result<WorkCalendar, InvalidDayStartHour> {
        WorkCalendar::new(self.day_start_hour)
    }
}

/// Returns the platform-specific config directory for wt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wt"))
}

/// Returns the platform-specific data directory for wt.
///
/// On Linux: `~/.local/share/wt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("wt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_returns_some() {
        assert!(dirs_data_path().is_some());
    }

    #[test]
    fn test_default_config_uses_data_dir_for_logs() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.log_path, data_dir.join("logs.tsv"));
    }

    #[test]
    fn test_default_schedule_matches_targets() {
        let config = Config::default();
        let schedule = config.target_schedule();
        assert!((schedule.for_weekday(1) - 6.25 * 3600.0).abs() < 1e-6);
        assert!(schedule.for_weekday(0).abs() < 1e-6);
    }

    #[test]
    fn test_default_day_start_hour_is_valid() {
        assert!(Config::default().calendar().is_ok());
    }
}
