//! Persisted log records and their wire format.
//!
//! A record is one line of UTF-8 text: `<unix_timestamp_float>\t<state>`.
//! Records are ordered by timestamp; equal timestamps fall back to file
//! order, which streaming readers must preserve.

use thiserror::Error;

use crate::state::{StateLabel, UnknownStateLabel};

/// A log line that does not parse as a record.
#[derive(Debug, Error)]
pub enum ParseRecordError {
    /// The line has no tab separator.
    #[error("expected \"<timestamp>\\t<state>\", got {line:?}")]
    MissingField { line: String },

    /// The timestamp field is not a float.
    #[error("invalid timestamp {value:?}")]
    BadTimestamp {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// The state field is outside the closed label set.
    #[error(transparent)]
    UnknownState(#[from] UnknownStateLabel),
}

/// Errors produced while streaming records out of a store.
///
/// A malformed line aborts the stream: downstream interval derivation
/// assumes a clean total order over the whole file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("i/o error reading log store")]
    Io(#[from] std::io::Error),

    #[error("malformed log record")]
    Malformed(#[from] ParseRecordError),
}

/// A single `(timestamp, state)` observation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Unix seconds.
    pub timestamp: f64,
    pub state: StateLabel,
}

impl LogRecord {
    #[must_use]
    pub const fn new(timestamp: f64, state: StateLabel) -> Self {
        Self { timestamp, state }
    }

    /// Parses one log line, without its trailing newline.
    pub fn parse_line(line: &str) -> Result<Self, ParseRecordError> {
        let trimmed = line.trim();
        let Some((timestamp_str, state_str)) = trimmed.split_once('\t') else {
            return Err(ParseRecordError::MissingField {
                line: trimmed.to_string(),
            });
        };
        let timestamp = timestamp_str
            .parse()
            .map_err(|source| ParseRecordError::BadTimestamp {
                value: timestamp_str.to_string(),
                source,
            })?;
        let state = state_str.parse()?;
        Ok(Self { timestamp, state })
    }

    /// The wire representation, newline included.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}\t{}\n", self.timestamp, self.state)
    }
}
