//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::{Error, ProcessFailedDetails, Result};

/// Captured output from a command that exited successfully.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessOutput {
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl ProcessOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Trimmed stdout, for commands whose output is a single value.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs external programs to completion.
///
/// Implementations must return `Err` with a `process.failed` error for a
/// non-zero exit, so callers only ever see successful output.
pub trait ProcessRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput>;
}

/// `ProcessRunner` backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        tracing::debug!(program, ?args, cwd = %cwd.display(), "running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| {
                Error::internal_io(
                    format!("Failed to run {}: {}", program, e),
                    Some(program.to_string()),
                )
            })?;

        check_output(program, args, output)
    }
}

/// Convert a finished `Output` into a `ProcessOutput`, failing on non-zero exit.
pub fn check_output(program: &str, args: &[String], output: Output) -> Result<ProcessOutput> {
    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(Error::process_failed(ProcessFailedDetails {
            program: program.to_string(),
            args: args.to_vec(),
            exit_code,
            stdout,
            stderr,
        }));
    }

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
    })
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(stdout: &str, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    }
}

/// Build an owned argument vector from string slices.
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
