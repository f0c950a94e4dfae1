//! File-backed log store for the worktime tracker.
//!
//! Records live in a UTF-8 text file, one `<timestamp>\t<state>` line per
//! record, strictly timestamp-ascending. The file is append-only in normal
//! operation; [`LogStore::rewrite`] is the single exception and always backs
//! the file up first.
//!
//! Writers take an advisory lock on a `.lock` sibling file, so two processes
//! cannot interleave an append with a rewrite. Readers need no lock: appends
//! are single whole-line writes and rewrites swap the file in atomically.

mod calendar_files;
mod reverse;

pub use calendar_files::{CalendarFileError, load_days_off, load_dont_count};
pub use reverse::ReverseLines;

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use thiserror::Error;

use wt_core::{LogRecord, ReadError, StateLabel};

/// Store errors beyond plain record-stream failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on log store")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Read(#[from] ReadError),

    /// Rewriting time at or after the newest record is not allowed.
    #[error("cannot rewrite unrecorded time: {end} is not before the newest record at {latest}")]
    FutureRewrite { end: f64, latest: f64 },

    #[error("log store at {path} is empty")]
    Empty { path: PathBuf },
}

/// Append-only persisted sequence of `(timestamp, state)` records, plus the
/// `last-check` sidecar recording when the probe last ran.
#[derive(Debug)]
pub struct LogStore {
    path: PathBuf,
    last_check_path: PathBuf,
}

impl LogStore {
    /// Opens the store, creating and seeding it if absent or empty.
    ///
    /// The seed is a single neutral record at timestamp 0, so every later
    /// read finds at least one record to pair against.
    pub fn open(
        path: impl Into<PathBuf>,
        last_check_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            last_check_path: last_check_path.into(),
        };
        if let Some(parent) = store.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let is_empty = fs::metadata(&store.path).map_or(true, |meta| meta.len() == 0);
        if is_empty {
            tracing::debug!(path = %store.path.display(), "seeding empty log store");
            store.append(&LogRecord::new(0.0, StateLabel::NEUTRAL))?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a single whole-line write.
    pub fn append(&self, record: &LogRecord) -> Result<(), StoreError> {
        let _lock = self.lock_writer()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.to_line().as_bytes())?;
        Ok(())
    }

    /// Appends only when the state differs from the newest record's.
    ///
    /// This is the only write path used by normal operation; it is what keeps
    /// adjacent persisted records from repeating a state. Returns whether a
    /// record was written.
    pub fn write_if_state_changed(&self, record: &LogRecord) -> Result<bool, StoreError> {
        let last = self.last_record()?;
        if last.state == record.state {
            return Ok(false);
        }
        self.append(record)?;
        Ok(true)
    }

    /// The newest record.
    pub fn last_record(&self) -> Result<LogRecord, StoreError> {
        match self.read_reverse()?.next() {
            Some(record) => Ok(record?),
            None => Err(StoreError::Empty {
                path: self.path.clone(),
            }),
        }
    }

    /// The oldest record.
    pub fn first_record(&self) -> Result<LogRecord, StoreError> {
        match self.read_forward()?.next() {
            Some(record) => Ok(record?),
            None => Err(StoreError::Empty {
                path: self.path.clone(),
            }),
        }
    }

    /// Streams records newest to oldest. Each call re-opens the file.
    pub fn read_reverse(
        &self,
    ) -> Result<impl Iterator<Item = Result<LogRecord, ReadError>> + '_, StoreError> {
        let lines = ReverseLines::open(&self.path)?;
        Ok(lines.map(parse_line_result))
    }

    /// Streams records oldest to newest.
    pub fn read_forward(
        &self,
    ) -> Result<impl Iterator<Item = Result<LogRecord, ReadError>> + '_, StoreError> {
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(reader
            .lines()
            .filter(|line| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(parse_line_result))
    }

    /// Replaces `[start, end]` with `new_state`, preserving what followed.
    ///
    /// The record set is partitioned around the window; the last state inside
    /// it (or, with an empty window, the state in force before it) is
    /// reinserted at `end`, so the rewrite cannot retroactively change what
    /// happened afterwards. Adjacent records left with identical states are
    /// collapsed. The previous file is kept as a timestamped backup.
    pub fn rewrite(&self, start: f64, end: f64, new_state: StateLabel) -> Result<(), StoreError> {
        let records = self.read_all()?;
        let latest = records
            .last()
            .ok_or_else(|| StoreError::Empty {
                path: self.path.clone(),
            })?
            .timestamp;
        if end >= latest {
            return Err(StoreError::FutureRewrite { end, latest });
        }
        let rewritten = rewritten_records(&records, start, end, new_state);

        let _lock = self.lock_writer()?;
        let backup = self.backup()?;
        self.replace_all(&rewritten)?;
        tracing::info!(
            start,
            end,
            state = %new_state,
            backup = %backup.display(),
            "rewrote history"
        );
        Ok(())
    }

    /// When the probe last ran; 0 when never recorded.
    pub fn read_last_check(&self) -> Result<f64, StoreError> {
        let contents = match fs::read_to_string(&self.last_check_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.write_last_check(0.0)?;
                return Ok(0.0);
            }
            Err(err) => return Err(err.into()),
        };
        let trimmed = contents.trim();
        trimmed.parse().map_err(|source| {
            StoreError::Read(ReadError::Malformed(
                wt_core::ParseRecordError::BadTimestamp {
                    value: trimmed.to_string(),
                    source,
                },
            ))
        })
    }

    pub fn write_last_check(&self, timestamp: f64) -> Result<(), StoreError> {
        if let Some(parent) = self.last_check_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.last_check_path, format!("{timestamp}\n"))?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<LogRecord>, StoreError> {
        Ok(self.read_forward()?.collect::<Result<Vec<_>, _>>()?)
    }

    /// Advisory exclusive lock held by writers; released on drop.
    fn lock_writer(&self) -> Result<File, StoreError> {
        let lock_path = sibling_path(&self.path, ".lock");
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path)?;
        lock.lock_exclusive()?;
        Ok(lock)
    }

    fn backup(&self) -> Result<PathBuf, StoreError> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        let backup_path = sibling_path(&self.path, &format!(".bck{stamp}"));
        fs::copy(&self.path, &backup_path)?;
        tracing::debug!(backup = %backup_path.display(), "backed up log store");
        Ok(backup_path)
    }

    /// Writes the full record set to a sibling temp file, then swaps it in.
    fn replace_all(&self, records: &[LogRecord]) -> Result<(), StoreError> {
        let tmp_path = sibling_path(&self.path, ".tmp");
        let mut file = File::create(&tmp_path)?;
        for record in records {
            file.write_all(record.to_line().as_bytes())?;
        }
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{suffix}", path.display()))
}

fn parse_line_result(line: io::Result<String>) -> Result<LogRecord, ReadError> {
    let line = line?;
    Ok(LogRecord::parse_line(&line)?)
}

/// Reconstructs the record set with `(start, end]` replaced by `new_state`.
///
/// Boundary handling:
/// - the last state inside the window (or before it, if the window holds no
///   records) is carried to a record at `end`, keeping the post-window
///   timeline intact;
/// - if the record just before the window already has `new_state`, the new
///   segment's boundary slides left to that record's timestamp;
/// - a symmetric check drops a first post-window record with `new_state`.
///
/// The result never contains two adjacent records with the same state.
#[must_use]
pub fn rewritten_records(
    records: &[LogRecord],
    start: f64,
    end: f64,
    new_state: StateLabel,
) -> Vec<LogRecord> {
    let mut before: Vec<LogRecord> = records
        .iter()
        .filter(|record| record.timestamp <= start)
        .cloned()
        .collect();
    let inside: Vec<&LogRecord> = records
        .iter()
        .filter(|record| start < record.timestamp && record.timestamp <= end)
        .collect();
    let after: Vec<LogRecord> = records
        .iter()
        .filter(|record| record.timestamp > end)
        .cloned()
        .collect();

    let carried = inside
        .last()
        .map(|record| record.state)
        .or_else(|| before.last().map(|record| record.state));

    let mut tail: Vec<LogRecord> = Vec::with_capacity(after.len() + 1);
    if let Some(state) = carried {
        tail.push(LogRecord::new(end, state));
    }
    tail.extend(after);

    let mut segment_start = start;
    if let Some(last) = before.last() {
        if last.state == new_state {
            segment_start = last.timestamp;
            before.pop();
        }
    }
    if tail.first().is_some_and(|record| record.state == new_state) {
        tail.remove(0);
    }

    let mut result = before;
    result.push(LogRecord::new(segment_start, new_state));
    result.append(&mut tail);
    collapse_adjacent_states(result)
}

/// Drops records repeating the previous record's state. Such runs do not
/// change derived worktime; the first record of a run wins.
fn collapse_adjacent_states(records: Vec<LogRecord>) -> Vec<LogRecord> {
    let mut cleaned: Vec<LogRecord> = Vec::with_capacity(records.len());
    for record in records {
        if cleaned.last().is_some_and(|last| last.state == record.state) {
            continue;
        }
        cleaned.push(record);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wt_core::WorkCalendar;

    fn ts(hour: u32, min: u32) -> f64 {
        let date = NaiveDate::from_ymd_opt(2021, 12, 7).unwrap();
        WorkCalendar::to_timestamp(date.and_hms_opt(hour, min, 0).unwrap())
    }

    fn store_with(records: &[LogRecord]) -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(dir.path().join("logs.tsv"), dir.path().join("last_check.txt"))
            .unwrap();
        for record in records {
            store.append(record).unwrap();
        }
        (dir, store)
    }

    fn scenario_records() -> Vec<LogRecord> {
        vec![
            LogRecord::new(ts(8, 0), StateLabel::Locked),
            LogRecord::new(ts(11, 0), StateLabel::Work),
            LogRecord::new(ts(11, 30), StateLabel::Personal),
            LogRecord::new(ts(12, 0), StateLabel::Work),
            LogRecord::new(ts(12, 30), StateLabel::Personal),
        ]
    }

    #[test]
    fn open_seeds_an_absent_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open(
            dir.path().join("logs/logs.tsv"),
            dir.path().join("logs/last_check.txt"),
        )
        .unwrap();
        let first = store.first_record().unwrap();
        assert_eq!(first, LogRecord::new(0.0, StateLabel::NEUTRAL));
    }

    #[test]
    fn forward_and_reverse_reads_agree() {
        let (_dir, store) = store_with(&scenario_records());
        let forward: Vec<LogRecord> = store
            .read_forward()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let mut reverse: Vec<LogRecord> = store
            .read_reverse()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        reverse.reverse();
        assert_eq!(forward, reverse);
        // The seed record plus the five appended ones.
        assert_eq!(forward.len(), 6);
    }

    #[test]
    fn conditional_append_skips_repeated_states() {
        let (_dir, store) = store_with(&[]);
        assert!(
            store
                .write_if_state_changed(&LogRecord::new(100.0, StateLabel::Work))
                .unwrap()
        );
        assert!(
            !store
                .write_if_state_changed(&LogRecord::new(200.0, StateLabel::Work))
                .unwrap()
        );
        assert!(
            store
                .write_if_state_changed(&LogRecord::new(300.0, StateLabel::Locked))
                .unwrap()
        );
        assert_eq!(store.read_forward().unwrap().count(), 3);
    }

    #[test]
    fn malformed_line_aborts_the_read() {
        let (_dir, store) = store_with(&scenario_records());
        fs::write(
            store.path(),
            format!("{}not-a-record\n", fs::read_to_string(store.path()).unwrap()),
        )
        .unwrap();

        let result: Result<Vec<LogRecord>, ReadError> =
            store.read_forward().unwrap().collect();
        assert!(matches!(result, Err(ReadError::Malformed(_))));
    }

    #[test]
    fn rewrite_carries_the_last_inside_state() {
        let records = scenario_records();
        let rewritten = rewritten_records(&records, ts(10, 0), ts(12, 10), StateLabel::Work);
        assert_eq!(
            rewritten,
            vec![
                LogRecord::new(ts(8, 0), StateLabel::Locked),
                LogRecord::new(ts(10, 0), StateLabel::Work),
                LogRecord::new(ts(12, 30), StateLabel::Personal),
            ]
        );
    }

    #[test]
    fn rewrite_of_an_empty_window_carries_the_state_before() {
        let records = vec![
            LogRecord::new(ts(8, 0), StateLabel::Locked),
            LogRecord::new(ts(10, 0), StateLabel::Work),
            LogRecord::new(ts(12, 30), StateLabel::Personal),
        ];
        let rewritten = rewritten_records(&records, ts(11, 30), ts(12, 10), StateLabel::Personal);
        assert_eq!(
            rewritten,
            vec![
                LogRecord::new(ts(8, 0), StateLabel::Locked),
                LogRecord::new(ts(10, 0), StateLabel::Work),
                LogRecord::new(ts(11, 30), StateLabel::Personal),
                LogRecord::new(ts(12, 10), StateLabel::Work),
                LogRecord::new(ts(12, 30), StateLabel::Personal),
            ]
        );
    }

    #[test]
    fn rewrite_merges_a_matching_left_neighbor() {
        let records = vec![
            LogRecord::new(ts(8, 0), StateLabel::Locked),
            LogRecord::new(ts(10, 0), StateLabel::Work),
            LogRecord::new(ts(11, 0), StateLabel::Personal),
            LogRecord::new(ts(12, 30), StateLabel::Locked),
        ];
        let rewritten = rewritten_records(&records, ts(10, 30), ts(12, 0), StateLabel::Work);
        // The work run slides back to 10:00 instead of adding a duplicate.
        assert_eq!(
            rewritten,
            vec![
                LogRecord::new(ts(8, 0), StateLabel::Locked),
                LogRecord::new(ts(10, 0), StateLabel::Work),
                LogRecord::new(ts(12, 0), StateLabel::Personal),
                LogRecord::new(ts(12, 30), StateLabel::Locked),
            ]
        );
    }

    #[test]
    fn rewritten_records_never_repeat_adjacent_states() {
        let records = scenario_records();
        for (start, end, state) in [
            (ts(9, 0), ts(11, 15), StateLabel::Work),
            (ts(11, 0), ts(12, 15), StateLabel::Personal),
            (ts(8, 30), ts(12, 15), StateLabel::Locked),
            (ts(11, 30), ts(11, 45), StateLabel::Work),
        ] {
            let rewritten = rewritten_records(&records, start, end, state);
            for pair in rewritten.windows(2) {
                assert_ne!(pair[0].state, pair[1].state, "{start}..{end} {state}");
            }
        }
    }

    #[test]
    fn future_rewrite_fails_and_leaves_the_store_untouched() {
        let (_dir, store) = store_with(&scenario_records());
        let before = fs::read_to_string(store.path()).unwrap();

        let result = store.rewrite(ts(12, 0), ts(13, 0), StateLabel::Work);
        assert!(matches!(result, Err(StoreError::FutureRewrite { .. })));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn rewrite_backs_up_and_replaces_the_file() {
        let (dir, store) = store_with(&scenario_records());
        let before = fs::read_to_string(store.path()).unwrap();

        store.rewrite(ts(10, 0), ts(12, 10), StateLabel::Work).unwrap();

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .contains("logs.tsv.bck")
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), before);

        let records: Vec<LogRecord> = store
            .read_forward()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        // The seed and the 8:00 record shared a state, so the run collapsed.
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], LogRecord::new(ts(10, 0), StateLabel::Work));
        assert_eq!(records[2], LogRecord::new(ts(12, 30), StateLabel::Personal));
    }

    #[test]
    fn last_check_sidecar_seeds_zero() {
        let (_dir, store) = store_with(&[]);
        assert!((store.read_last_check().unwrap()).abs() < f64::EPSILON);
        store.write_last_check(123.5).unwrap();
        assert!((store.read_last_check().unwrap() - 123.5).abs() < f64::EPSILON);
    }
}
