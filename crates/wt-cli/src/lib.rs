//! Command-line surface and runtime glue for the worktime tracker.

pub mod cli;
pub mod commands;
pub mod config;
pub mod format;
pub mod probe;
pub mod shutdown;
pub mod tracker;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use probe::{CommandProbe, StateProbe};
pub use tracker::WorktimeTracker;
