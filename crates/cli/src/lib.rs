// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for Benchbot.
//!
//! Offline access to the comparison engine (`compare`, `validate`) and a local
//! run of the whole pipeline against two revisions (`run`).

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use benchbot_benchmarks::{compare, io as result_io, markdown};
use benchbot_pipeline::event::{Branch, PullRequest, Repository};
use benchbot_pipeline::{
    CommandSpec, Orchestrator, PullRequestAction, PullRequestEvent, StdoutPublisher, SuiteRunner,
    ToolConfig, WorkspaceManager,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Benchbot CLI.
#[derive(Parser, Debug)]
#[command(name = "benchbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two benchmark result documents and print the report.
    Compare {
        /// Result of the base revision.
        #[arg(long)]
        base: PathBuf,

        /// Result of the candidate revision.
        #[arg(long)]
        candidate: PathBuf,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the comparison as JSON instead of markdown.
        #[arg(long)]
        json: bool,
    },

    /// Check that documents are well-formed benchmark results.
    Validate {
        /// Documents to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Benchmark two revisions locally and print the report.
    ///
    /// Workspaces are created under the scratch root and removed afterwards.
    Run {
        /// Clone URL of the base revision.
        #[arg(long)]
        base_url: String,

        /// Branch or ref of the base revision.
        #[arg(long)]
        base_ref: String,

        /// Clone URL of the candidate revision.
        #[arg(long)]
        head_url: String,

        /// Branch or ref of the candidate revision.
        #[arg(long)]
        head_ref: String,

        /// Suite entry file, relative to the repository root.
        #[arg(long)]
        suite: PathBuf,

        /// Directory workspaces are created in.
        #[arg(long, default_value = "./tmp")]
        scratch_root: PathBuf,

        /// Dependency install command line.
        #[arg(long, default_value = "npm i --quiet")]
        install: String,

        /// Program the suite entry file is run with.
        #[arg(long, default_value = "node")]
        interpreter: String,

        /// Suite run timeout in seconds.
        #[arg(long, default_value_t = 1800)]
        run_timeout: u64,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli.command).await
}

/// Run one command.
pub async fn execute(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Compare {
            base,
            candidate,
            output,
            json,
        } => {
            let text = compare_files(&base, &candidate, json)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "Report written");
                }
                None => print!("{}", text),
            }
            Ok(())
        }
        Commands::Validate { files } => {
            let failed = validate_files(&files);
            if failed > 0 {
                bail!("{} of {} documents failed validation", failed, files.len());
            }
            Ok(())
        }
        Commands::Run {
            base_url,
            base_ref,
            head_url,
            head_ref,
            suite,
            scratch_root,
            install,
            interpreter,
            run_timeout,
        } => {
            let install = CommandSpec::parse(&install).context("--install must not be empty")?;
            let interpreter =
                CommandSpec::parse(&interpreter).context("--interpreter must not be empty")?;
            if run_timeout == 0 {
                bail!("--run-timeout must be positive");
            }

            let tools = ToolConfig {
                install,
                ..ToolConfig::default()
            };
            let workspaces = Arc::new(WorkspaceManager::new(scratch_root, tools));
            let runner = Arc::new(SuiteRunner::new(
                suite,
                interpreter,
                Duration::from_secs(run_timeout),
            ));
            let orchestrator = Orchestrator::new(workspaces, runner, Arc::new(StdoutPublisher));

            let event = local_event(base_url, base_ref, head_url, head_ref);
            let run = orchestrator.handle_pull_request_event(&event).await?;
            info!(
                run_id = %run.run_id,
                duration_ms = run.duration_ms.unwrap_or_default(),
                "Local run finished"
            );
            Ok(())
        }
    }
}

/// Load, compare and render two documents.
pub fn compare_files(base: &Path, candidate: &Path, json: bool) -> anyhow::Result<String> {
    let base_result =
        result_io::read_result(base).with_context(|| format!("loading {}", base.display()))?;
    let candidate_result = result_io::read_result(candidate)
        .with_context(|| format!("loading {}", candidate.display()))?;

    let comparison = compare(&base_result, &candidate_result);
    if json {
        let mut text = serde_json::to_string_pretty(&comparison)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(markdown::render(&comparison))
    }
}

/// Validate each file, printing one line per file. Returns the number of
/// failures.
pub fn validate_files(files: &[PathBuf]) -> usize {
    let mut failed = 0;
    for file in files {
        match result_io::read_result(file) {
            Ok(result) => {
                let tests: usize = result.suites.iter().map(|s| s.tests.len()).sum();
                println!(
                    "{} {} ({} suites, {} tests)",
                    "[OK]".green().bold(),
                    file.display(),
                    result.suites.len(),
                    tests
                );
            }
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "[FAIL]".red().bold(), file.display(), e);
            }
        }
    }
    failed
}

fn local_event(
    base_url: String,
    base_ref: String,
    head_url: String,
    head_ref: String,
) -> PullRequestEvent {
    let branch = |clone_url: String, git_ref: String| Branch {
        git_ref,
        repo: Some(Repository {
            clone_url,
            full_name: String::new(),
        }),
    };
    PullRequestEvent {
        action: PullRequestAction::Opened,
        number: 0,
        pull_request: PullRequest {
            title: "local run".to_string(),
            head: branch(head_url, head_ref),
            base: branch(base_url, base_ref),
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
