//! External state probe seam.

use std::process::Command;

use anyhow::{Context, Result, bail};

use wt_core::StateLabel;

/// Source of the current activity state.
///
/// Implementations are expected to be flaky: the desktop may be mid-switch,
/// the probe process may fail transiently. Callers skip the poll tick on
/// error and try again on the next one; errors never reach the core.
pub trait StateProbe {
    fn state(&mut self) -> Result<StateLabel>;
}

/// Probe that shells out to a configured command and parses its stdout.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    command: String,
}

impl CommandProbe {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl StateProbe for CommandProbe {
    fn state(&mut self) -> Result<StateLabel> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .with_context(|| format!("failed to run probe command {:?}", self.command))?;
        if !output.status.success() {
            bail!("probe command exited with {}", output.status);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let state = stdout
            .trim()
            .parse()
            .context("probe command printed an unknown state")?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_stdout() {
        let mut probe = CommandProbe::new("echo work");
        assert_eq!(probe.state().unwrap(), StateLabel::Work);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let mut probe = CommandProbe::new("printf '  locked \\n'");
        assert_eq!(probe.state().unwrap(), StateLabel::Locked);
    }

    #[test]
    fn unknown_output_is_an_error() {
        let mut probe = CommandProbe::new("echo coffee");
        assert!(probe.state().is_err());
    }

    #[test]
    fn failing_command_is_an_error() {
        let mut probe = CommandProbe::new("exit 3");
        assert!(probe.state().is_err());
    }
}
