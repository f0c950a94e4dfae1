//! Activity state labels.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error type for state strings outside the closed label set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state label: {0}")]
pub struct UnknownStateLabel(pub String);

/// Canonical activity states recorded in the log.
///
/// Labels are validated at parse time; a record carrying anything outside
/// this set is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateLabel {
    Work,
    Personal,
    Locked,
}

impl StateLabel {
    /// The state used for the bootstrap record and synthetic closing records.
    pub const NEUTRAL: Self = Self::Locked;

    /// Whether time spent in this state counts toward work totals.
    #[must_use]
    pub const fn is_work(self) -> bool {
        matches!(self, Self::Work)
    }

    /// String representation used in the log file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StateLabel {
    type Err = UnknownStateLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Self::Work),
            "personal" => Ok(Self::Personal),
            "locked" => Ok(Self::Locked),
            _ => Err(UnknownStateLabel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_labels() {
        for label in [StateLabel::Work, StateLabel::Personal, StateLabel::Locked] {
            let parsed: StateLabel = label.as_str().parse().expect("should parse");
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn unknown_label_errors() {
        let result: Result<StateLabel, _> = "coffee".parse();
        assert_eq!(result, Err(UnknownStateLabel("coffee".to_string())));
    }

    #[test]
    fn only_work_counts_as_work() {
        assert!(StateLabel::Work.is_work());
        assert!(!StateLabel::Personal.is_work());
        assert!(!StateLabel::Locked.is_work());
    }

    #[test]
    fn neutral_is_not_a_work_state() {
        assert!(!StateLabel::NEUTRAL.is_work());
    }
}
