// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Side-effecting half of Benchbot: workspaces, suite runs and publishing.
//!
//! An [`Orchestrator`] takes a [`PullRequestEvent`] through the whole pipeline:
//!
//! 1. create a workspace and check out the base revision, then run the suite
//! 2. do the same for the head revision
//! 3. compare the two results and render the markdown report
//! 4. hand the report to a [`Publisher`]
//! 5. remove every workspace it created, whatever happened before
//!
//! # Quick Start
//!
//! ```no_run
//! use benchbot_pipeline::{
//!     CommandSpec, Orchestrator, StdoutPublisher, SuiteRunner, ToolConfig, WorkspaceManager,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(event: benchbot_pipeline::PullRequestEvent) {
//! let workspaces = Arc::new(WorkspaceManager::new("./tmp", ToolConfig::default()));
//! let runner = Arc::new(SuiteRunner::new(
//!     "benchmark/suite.js",
//!     CommandSpec::new("node"),
//!     Duration::from_secs(1800),
//! ));
//! let orchestrator = Orchestrator::new(workspaces, runner, Arc::new(StdoutPublisher));
//!
//! match orchestrator.handle_pull_request_event(&event).await {
//!     Ok(run) => println!("finished in state {}", run.state),
//!     Err(e) => eprintln!("{}", e),
//! }
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod command;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod publisher;
pub mod runner;
pub mod workspace;

pub use command::{CommandError, CommandOutput, CommandSpec};
pub use error::{OrchestrationError, PipelineError, Result};
pub use event::{PullRequestAction, PullRequestEvent, Revision};
pub use orchestrator::Orchestrator;
pub use publisher::{GitHubPublisher, Publisher, StdoutPublisher};
pub use runner::{BenchmarkRunner, SuiteRunner};
pub use workspace::{RevisionProvisioner, ToolConfig, Workspace, WorkspaceManager};
