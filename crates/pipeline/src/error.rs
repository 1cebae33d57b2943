// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while processing one pull-request event.

use benchbot_benchmarks::ShapeError;
use benchbot_core::{EventRun, RunState};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline steps.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure of a single pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The workspace directory could not be created.
    #[error("Failed to create workspace {path}: {source}")]
    Workspace {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The repository could not be fetched.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// Clone URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// The ref does not exist or could not be checked out.
    #[error("Failed to check out {git_ref}: {reason}")]
    Checkout {
        /// Branch or ref.
        git_ref: String,
        /// What went wrong.
        reason: String,
    },

    /// The package manager failed.
    #[error("Failed to install dependencies in workspace {workspace_id}: {reason}")]
    Dependency {
        /// Workspace the install ran in.
        workspace_id: String,
        /// What went wrong.
        reason: String,
    },

    /// The suite entry file is missing or its output is not a document.
    #[error("Failed to load suite {path}: {reason}")]
    SuiteLoad {
        /// Entry file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The suite could not be run to completion.
    #[error("Suite {path} failed: {reason}")]
    SuiteExecution {
        /// Entry file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The suite produced a document with the wrong shape.
    #[error("Suite {path} produced an invalid result: {source}")]
    SuiteShape {
        /// Entry file.
        path: PathBuf,
        /// Shape violations.
        #[source]
        source: ShapeError,
    },

    /// The report could not be posted.
    #[error("Failed to publish report on #{pr_number}: {reason}")]
    Publish {
        /// Pull request the comment was meant for.
        pr_number: u64,
        /// What went wrong.
        reason: String,
    },
}

impl PipelineError {
    /// Short stable name of the error kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workspace { .. } => "workspace",
            Self::Fetch { .. } => "fetch",
            Self::Checkout { .. } => "checkout",
            Self::Dependency { .. } => "dependency",
            Self::SuiteLoad { .. } => "suite_load",
            Self::SuiteExecution { .. } => "suite_execution",
            Self::SuiteShape { .. } => "suite_shape",
            Self::Publish { .. } => "publish",
        }
    }
}

/// A pull-request event whose processing failed.
///
/// Cleanup has already run by the time this is returned.
#[derive(Debug, Error)]
#[error("PR #{pr_number} failed while {stage}: {source}")]
pub struct OrchestrationError {
    /// Pull-request number.
    pub pr_number: u64,
    /// State the run was in when the step failed.
    pub stage: RunState,
    /// The failing step's error.
    #[source]
    pub source: PipelineError,
    /// Full record of the run.
    pub run: Box<EventRun>,
}
