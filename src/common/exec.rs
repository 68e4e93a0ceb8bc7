//! The subprocess boundary.
//!
//! Every real effect in this crate is a single external command invocation:
//! `apt-get install`, `brew list`, `mise use`, `add-apt-repository`. The
//! [`Executor`] trait is the one seam between the engine and those binaries,
//! so the resolver, cache and adapters can be exercised in tests on machines
//! that have none of the package managers installed.

use anyhow::{Context, Result};
use duct::cmd;

/// Runs external commands and answers availability probes.
pub trait Executor {
    /// Whether `program` resolves on PATH.
    fn has_command(&self, program: &str) -> bool;

    /// Run a command for its side effects, inheriting stdio.
    ///
    /// Returns `Ok(false)` when the command ran but exited non-zero; spawn
    /// failures are real errors.
    fn run(&self, program: &str, args: &[&str]) -> Result<bool>;

    /// Run a command and capture its stdout. Non-zero exit is an error.
    fn read(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// The production executor: duct for subprocesses, which for probes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn has_command(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<bool> {
        let output = cmd(program, args)
            .unchecked()
            .run()
            .with_context(|| format!("failed to spawn {program}"))?;
        Ok(output.status.success())
    }

    fn read(&self, program: &str, args: &[&str]) -> Result<String> {
        cmd(program, args)
            .read()
            .with_context(|| format!("failed to run {program}"))
    }
}

/// Render a command line for dry-run output and error messages.
pub fn render_command(program: &str, args: &[&str]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
