// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Running a benchmark suite inside a workspace.
//!
//! The suite is an opaque program: it is started with the configured
//! interpreter and must print one result document on standard output. An
//! entry file ending in `.json` is taken to be such a document already and is
//! read without running anything.

use crate::command::{self, CommandSpec};
use crate::error::{PipelineError, Result};
use crate::workspace::Workspace;
use async_trait::async_trait;
use benchbot_benchmarks::io::{self as result_io, LoadError};
use benchbot_benchmarks::BenchmarkResult;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Produces a benchmark result for a provisioned workspace.
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    /// Run the suite in `workspace`.
    async fn run(&self, workspace: &Workspace) -> Result<BenchmarkResult>;
}

/// Runs the suite entry file found at a fixed relative path.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    entry_file: PathBuf,
    interpreter: CommandSpec,
    timeout: Duration,
}

impl SuiteRunner {
    /// Runner for `entry_file` (relative to the workspace), started with
    /// `interpreter <entry_file>`.
    pub fn new(
        entry_file: impl Into<PathBuf>,
        interpreter: CommandSpec,
        timeout: Duration,
    ) -> Self {
        Self {
            entry_file: entry_file.into(),
            interpreter,
            timeout,
        }
    }

    /// Run the suite in `workspace_path` and load its result.
    pub async fn run_suite(&self, workspace_path: &Path) -> Result<BenchmarkResult> {
        let entry = workspace_path.join(&self.entry_file);
        if !tokio::fs::try_exists(&entry).await.unwrap_or(false) {
            return Err(PipelineError::SuiteLoad {
                path: self.entry_file.clone(),
                reason: "entry file not found".to_string(),
            });
        }

        let text = if is_document(&self.entry_file) {
            tokio::fs::read_to_string(&entry)
                .await
                .map_err(|e| PipelineError::SuiteLoad {
                    path: self.entry_file.clone(),
                    reason: e.to_string(),
                })?
        } else {
            let spec = self
                .interpreter
                .clone()
                .arg(self.entry_file.to_string_lossy());
            let output = command::run(&spec, workspace_path, self.timeout)
                .await
                .map_err(|e| PipelineError::SuiteExecution {
                    path: self.entry_file.clone(),
                    reason: e.to_string(),
                })?;
            info!(
                entry = %self.entry_file.display(),
                elapsed_ms = output.elapsed.as_millis() as u64,
                "Suite finished"
            );
            output.stdout
        };

        result_io::parse_result(&text).map_err(|e| match e {
            LoadError::Shape(source) => PipelineError::SuiteShape {
                path: self.entry_file.clone(),
                source,
            },
            other => PipelineError::SuiteLoad {
                path: self.entry_file.clone(),
                reason: other.to_string(),
            },
        })
    }
}

#[async_trait]
impl BenchmarkRunner for SuiteRunner {
    async fn run(&self, workspace: &Workspace) -> Result<BenchmarkResult> {
        self.run_suite(workspace.path()).await
    }
}

fn is_document(entry: &Path) -> bool {
    entry
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DOC: &str =
        r#"{"name":"X","suites":[{"name":"S","tests":[{"name":"T","stat":{"rps":1000}}]}]}"#;

    fn runner(entry: &str) -> SuiteRunner {
        SuiteRunner::new(entry, CommandSpec::new("sh"), Duration::from_secs(10))
    }

    fn write_suite(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_json_entry_is_read_directly() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "result.json", DOC);

        let result = runner("result.json").run_suite(dir.path()).await.unwrap();
        assert_eq!(result.name, "X");
    }

    #[tokio::test]
    async fn test_program_output_is_the_document() {
        let dir = tempdir().unwrap();
        write_suite(
            dir.path(),
            "bench.sh",
            &format!("echo 'warming up'\necho '{}'\n", DOC),
        );

        let result = runner("bench.sh").run_suite(dir.path()).await.unwrap();
        assert_eq!(result.suites[0].tests[0].measured_rps(), Some(1000.0));
    }

    #[tokio::test]
    async fn test_log_line_after_document_is_ignored() {
        let dir = tempdir().unwrap();
        write_suite(
            dir.path(),
            "bench.sh",
            &format!("echo '{}'\necho '{{\"level\":\"info\",\"msg\":\"done\"}}'\n", DOC),
        );

        let result = runner("bench.sh").run_suite(dir.path()).await.unwrap();
        assert_eq!(result.name, "X");
        assert_eq!(result.suites.len(), 1);
    }

    #[tokio::test]
    async fn test_only_log_lines_is_shape_error() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "bench.sh", "echo '{\"level\":\"info\",\"msg\":\"done\"}'\n");

        let err = runner("bench.sh").run_suite(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "suite_shape");
    }

    #[tokio::test]
    async fn test_missing_entry_is_load_error() {
        let dir = tempdir().unwrap();
        let err = runner("bench.sh").run_suite(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "suite_load");
    }

    #[tokio::test]
    async fn test_failing_suite_is_execution_error() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "bench.sh", "echo 'TypeError: x is undefined' >&2\nexit 1\n");

        let err = runner("bench.sh").run_suite(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "suite_execution");
        assert!(err.to_string().contains("TypeError"));
    }

    #[tokio::test]
    async fn test_hanging_suite_times_out() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "bench.sh", "sleep 10\n");

        let runner =
            SuiteRunner::new("bench.sh", CommandSpec::new("sh"), Duration::from_millis(200));
        let err = runner.run_suite(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "suite_execution");
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unparseable_output_is_load_error() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "bench.sh", "echo done\n");

        let err = runner("bench.sh").run_suite(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "suite_load");
    }

    #[tokio::test]
    async fn test_bad_shape_is_shape_error() {
        let dir = tempdir().unwrap();
        write_suite(
            dir.path(),
            "result.json",
            concat!(
                r#"{"name":"X","suites":[{"name":"S","tests":"#,
                r#"[{"name":"T","skipped":true,"stat":{"rps":1}}]}]}"#,
            ),
        );

        let err = runner("result.json").run_suite(dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), "suite_shape");
    }
}
