use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wt_cli::commands::{pace, report, rewrite, status, watch};
use wt_cli::{Cli, Commands, CommandProbe, Config, WorktimeTracker, shutdown};
use wt_core::Period;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let tracker = WorktimeTracker::open(&config)?;
    let mut stdout = io::stdout();

    match command {
        Commands::Status => status::run(&mut stdout, &tracker)?,
        Commands::Watch { interval, polls } => {
            let command = config
                .probe_command
                .clone()
                .context("probe_command is not configured")?;
            let mut probe = CommandProbe::new(command);
            let interval = Duration::from_secs(interval.unwrap_or(config.poll_interval_secs));
            let flag = shutdown::install_signal_flag();
            watch::run(&tracker, &mut probe, interval, flag, *polls)?;
        }
        Commands::Report {
            week: _,
            month,
            year,
            json,
        } => {
            let period = if *year {
                Period::Year
            } else if *month {
                Period::Month
            } else {
                Period::Week
            };
            report::run(&mut stdout, &tracker, period, *json)?;
        }
        Commands::Rewrite {
            start,
            end,
            state,
            day_offset,
        } => rewrite::run(&mut stdout, &tracker, start, end, state, *day_offset)?,
        Commands::Pace => pace::run(&mut stdout, &tracker)?,
    }

    Ok(())
}
