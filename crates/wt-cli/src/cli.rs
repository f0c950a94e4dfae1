//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Worktime tracker.
///
/// Reconstructs an activity timeline from state-change logs and reports work
/// time against weekly targets.
#[derive(Debug, Parser)]
#[command(name = "wt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the current state and this week's summaries.
    Status,

    /// Poll the state probe and record state changes until interrupted.
    Watch {
        /// Override the poll interval in seconds.
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many polls instead of running forever.
        #[arg(long)]
        polls: Option<u64>,
    },

    /// Overtime report for the current week, month or year.
    Report {
        /// Report on the current week (default).
        #[arg(long, conflicts_with_all = ["month", "year"])]
        week: bool,

        /// Report on the current month.
        #[arg(long, conflicts_with = "year")]
        month: bool,

        /// Report on the current year.
        #[arg(long)]
        year: bool,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a span of recorded history to a fixed state.
    Rewrite {
        /// Start clock time, HH:MM.
        #[arg(long)]
        start: String,

        /// End clock time, HH:MM.
        #[arg(long)]
        end: String,

        /// State to write over the span.
        #[arg(long)]
        state: String,

        /// Day offset from today (negative for past days).
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        day_offset: i64,
    },

    /// Compare today's pace against the historical ghost.
    Pace,
}
