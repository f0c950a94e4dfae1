//! Calendar exception files.
//!
//! Two hand-maintained files feed the accounting engine: days off
//! (`YYYY-MM-DD\t<proportion>`, 0 = normal day, 1 = fully off) and
//! don't-count days (one `YYYY-MM-DD` per line). `#` comments and blank
//! lines are ignored; anything else that fails to parse is an error rather
//! than a silent skip.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

/// Error type for the days-off and don't-count files.
#[derive(Debug, Error)]
pub enum CalendarFileError {
    #[error("i/o error reading {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed line {line_number} in {path}: {line:?}")]
    Malformed {
        path: String,
        line_number: usize,
        line: String,
    },
}

/// Loads the days-off file. A missing file means no days off.
pub fn load_days_off(path: &Path) -> Result<HashMap<NaiveDate, f64>, CalendarFileError> {
    let mut days_off = HashMap::new();
    for (line_number, line) in relevant_lines(path)? {
        let parsed = line.split_once('\t').and_then(|(date_str, prop_str)| {
            let date = parse_date(date_str)?;
            let proportion: f64 = prop_str.trim().parse().ok()?;
            (0.0..=1.0).contains(&proportion).then_some((date, proportion))
        });
        match parsed {
            Some((date, proportion)) => {
                days_off.insert(date, proportion);
            }
            None => return Err(malformed(path, line_number, &line)),
        }
    }
    Ok(days_off)
}

/// Loads the don't-count-days file. A missing file means no exclusions.
pub fn load_dont_count(path: &Path) -> Result<HashSet<NaiveDate>, CalendarFileError> {
    let mut dates = HashSet::new();
    for (line_number, line) in relevant_lines(path)? {
        match parse_date(&line) {
            Some(date) => {
                dates.insert(date);
            }
            None => return Err(malformed(path, line_number, &line)),
        }
    }
    Ok(dates)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn malformed(path: &Path, line_number: usize, line: &str) -> CalendarFileError {
    CalendarFileError::Malformed {
        path: path.display().to_string(),
        line_number,
        line: line.to_string(),
    }
}

/// Numbered, non-comment, non-blank lines; empty for a missing file.
fn relevant_lines(path: &Path) -> Result<Vec<(usize, String)>, CalendarFileError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CalendarFileError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };
    Ok(contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file.flush().unwrap();
        file
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 12, day).unwrap()
    }

    #[test]
    fn parses_days_off_with_comments() {
        let file = write_file("# holidays\n2021-12-24\t1\n2021-12-27\t0.5\n\n");
        let days_off = load_days_off(file.path()).unwrap();
        assert_eq!(days_off.len(), 2);
        assert!((days_off[&date(24)] - 1.0).abs() < f64::EPSILON);
        assert!((days_off[&date(27)] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_proportions() {
        let file = write_file("2021-12-24\t1.5\n");
        assert!(matches!(
            load_days_off(file.path()),
            Err(CalendarFileError::Malformed { line_number: 1, .. })
        ));
    }

    #[test]
    fn parses_dont_count_days() {
        let file = write_file("2021-12-20\n# vacation\n2021-12-21\n");
        let dates = load_dont_count(file.path()).unwrap();
        assert_eq!(dates.len(), 2);
        assert!(dates.contains(&date(20)));
    }

    #[test]
    fn rejects_garbage_dates() {
        let file = write_file("soon\n");
        assert!(matches!(
            load_dont_count(file.path()),
            Err(CalendarFileError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_files_mean_no_exceptions() {
        let path = Path::new("/nonexistent/days_off.txt");
        assert!(load_days_off(path).unwrap().is_empty());
        assert!(load_dont_count(path).unwrap().is_empty());
    }
}
