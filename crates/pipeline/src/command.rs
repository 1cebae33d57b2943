// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Subprocess execution with a deadline.
//!
//! Every external tool the pipeline drives (version control, package manager,
//! the suite itself) goes through [`run`]. The child is killed when the
//! deadline passes or the calling future is dropped.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt kept in error messages.
const STDERR_EXCERPT: usize = 2000;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
}

impl CommandSpec {
    /// A command without arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Split a command line on whitespace. Returns `None` for a blank line.
    ///
    /// No shell quoting is interpreted.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Wall-clock time the command took.
    pub elapsed: Duration,
}

/// Ways a command can fail.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Command line.
        command: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The deadline passed; the child was killed.
    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut {
        /// Command line.
        command: String,
        /// Deadline that passed.
        timeout: Duration,
    },

    /// The program exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// Command line.
        command: String,
        /// Exit status.
        status: ExitStatus,
        /// Tail of standard error.
        stderr: String,
    },
}

/// Run `spec` in `cwd`, waiting at most `timeout`.
///
/// The exit status is the only success signal.
pub async fn run(
    spec: &CommandSpec,
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let command_line = spec.to_string();
    let started = Instant::now();

    let child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| CommandError::Spawn {
            command: command_line.clone(),
            source,
        })?,
        Err(_) => {
            return Err(CommandError::TimedOut {
                command: command_line,
                timeout,
            })
        }
    };

    let elapsed = started.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    debug!(
        command = %command_line,
        cwd = %cwd.display(),
        status = %output.status,
        elapsed_ms = elapsed.as_millis() as u64,
        "Command finished"
    );

    if !output.status.success() {
        return Err(CommandError::Failed {
            command: command_line,
            status: output.status,
            stderr: tail(&stderr, STDERR_EXCERPT).trim().to_string(),
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        elapsed,
    })
}

fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_parse_command_line() {
        let spec = CommandSpec::parse("  npm i   --quiet ").unwrap();
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["i", "--quiet"]);
        assert_eq!(spec.to_string(), "npm i --quiet");
        assert!(CommandSpec::parse("   ").is_none());
    }

    #[tokio::test]
    async fn test_captures_stdout_in_cwd() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "here").unwrap();

        let output = run(&sh("cat marker"), dir.path(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(output.stdout, "here");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let dir = tempdir().unwrap();
        let err = run(&sh("echo broken >&2; exit 3"), dir.path(), Duration::from_secs(10))
            .await
            .unwrap_err();
        match err {
            CommandError::Failed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let dir = tempdir().unwrap();
        let spec = CommandSpec::new("definitely-not-a-real-program-benchbot");
        let err = run(&spec, dir.path(), Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_deadline_kills_command() {
        let dir = tempdir().unwrap();
        let started = Instant::now();
        let err = run(&sh("sleep 10"), dir.path(), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("aé", 1), "");
    }
}
