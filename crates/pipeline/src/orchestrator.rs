// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sequencing of one pull-request event through the pipeline.
//!
//! The base revision is provisioned and benchmarked first, then the candidate
//! revision, one after the other so the two runs never compete for the CPU.
//! Whatever step fails, every workspace created for the event is removed
//! before [`Orchestrator::handle_pull_request_event`] returns.

use crate::error::{OrchestrationError, PipelineError, Result};
use crate::event::{PullRequestEvent, Revision};
use crate::publisher::Publisher;
use crate::runner::BenchmarkRunner;
use crate::workspace::{RevisionProvisioner, Workspace, WorkspaceManager};
use benchbot_benchmarks::{compare, markdown};
use benchbot_core::{EventRun, RunState};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs the benchmark pipeline for pull-request events.
#[derive(Clone)]
pub struct Orchestrator {
    workspaces: Arc<WorkspaceManager>,
    provisioner: Arc<dyn RevisionProvisioner>,
    runner: Arc<dyn BenchmarkRunner>,
    publisher: Arc<dyn Publisher>,
}

impl Orchestrator {
    /// Orchestrator provisioning revisions with `workspaces` itself.
    pub fn new(
        workspaces: Arc<WorkspaceManager>,
        runner: Arc<dyn BenchmarkRunner>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let provisioner: Arc<dyn RevisionProvisioner> = workspaces.clone();
        Self {
            workspaces,
            provisioner,
            runner,
            publisher,
        }
    }

    /// Replace how revisions are checked out and installed.
    pub fn with_provisioner(mut self, provisioner: Arc<dyn RevisionProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Process one event.
    ///
    /// Actions other than `opened` and `synchronize` return immediately with
    /// the run in [`RunState::Ignored`]. Otherwise the run ends in
    /// [`RunState::Done`], and an error is returned when a step failed. In
    /// both cases the event's workspaces are gone when this returns.
    pub async fn handle_pull_request_event(
        &self,
        event: &PullRequestEvent,
    ) -> std::result::Result<EventRun, OrchestrationError> {
        let pr = &event.pull_request;
        let mut run = EventRun::new(event.number, &pr.base.git_ref, &pr.head.git_ref);

        if !event.action.triggers_benchmark() {
            info!(pr_number = event.number, action = ?event.action, "Pull request action ignored");
            advance(&mut run, RunState::Ignored);
            return Ok(run);
        }

        info!(
            pr_number = event.number,
            run_id = %run.run_id,
            title = %pr.title,
            base_ref = %run.base_ref,
            head_ref = %run.head_ref,
            "Benchmark run started"
        );

        let mut workspaces = Vec::new();
        let outcome = self.execute(event, &mut run, &mut workspaces).await;

        if let Err(err) = &outcome {
            if let Err(e) = run.fail(err.to_string()) {
                warn!(error = %e, "Could not record failure");
            }
        }

        advance(&mut run, RunState::CleaningUp);
        self.cleanup(&run, &workspaces).await;
        advance(&mut run, RunState::Done);

        match outcome {
            Ok(()) => {
                info!(
                    pr_number = run.pr_number,
                    run_id = %run.run_id,
                    duration_ms = run.duration_ms.unwrap_or_default(),
                    "Benchmark run completed"
                );
                Ok(run)
            }
            Err(source) => {
                let stage = run.failed_in.unwrap_or(run.state);
                error!(
                    pr_number = run.pr_number,
                    run_id = %run.run_id,
                    base_ref = %run.base_ref,
                    head_ref = %run.head_ref,
                    workspace_ids = ?run.workspace_ids,
                    stage = %stage,
                    kind = source.kind(),
                    error = %source,
                    "Benchmark run failed"
                );
                Err(OrchestrationError {
                    pr_number: run.pr_number,
                    stage,
                    source,
                    run: Box::new(run),
                })
            }
        }
    }

    async fn execute(
        &self,
        event: &PullRequestEvent,
        run: &mut EventRun,
        workspaces: &mut Vec<Workspace>,
    ) -> Result<()> {
        advance(run, RunState::ProvisioningBase);
        let base_revision = event
            .base_revision()
            .ok_or_else(|| missing_repository("base", &run.base_ref))?;
        let base_ws = self.provision(run, workspaces, &base_revision).await?;

        advance(run, RunState::RunningBase);
        let base = self.runner.run(&base_ws).await?;

        advance(run, RunState::ProvisioningCandidate);
        let head_revision = event
            .head_revision()
            .ok_or_else(|| missing_repository("head", &run.head_ref))?;
        let candidate_ws = self.provision(run, workspaces, &head_revision).await?;

        advance(run, RunState::RunningCandidate);
        let candidate = self.runner.run(&candidate_ws).await?;

        advance(run, RunState::Comparing);
        let comparison = compare(&base, &candidate);

        advance(run, RunState::Rendering);
        let body = markdown::render(&comparison);

        advance(run, RunState::Publishing);
        self.publisher.publish(run.pr_number, &body).await
    }

    async fn provision(
        &self,
        run: &mut EventRun,
        workspaces: &mut Vec<Workspace>,
        revision: &Revision,
    ) -> Result<Workspace> {
        let workspace = self.workspaces.create_workspace(None).await?;
        run.record_workspace(workspace.id());
        workspaces.push(workspace.clone());

        self.provisioner.provision(&workspace, revision).await?;
        Ok(workspace)
    }

    async fn cleanup(&self, run: &EventRun, workspaces: &[Workspace]) {
        for workspace in workspaces {
            if let Err(e) = self.workspaces.destroy_workspace(workspace).await {
                warn!(
                    pr_number = run.pr_number,
                    workspace_id = %workspace.id(),
                    error = %e,
                    "Failed to remove workspace"
                );
            }
        }
    }
}

fn advance(run: &mut EventRun, next: RunState) {
    if let Err(e) = run.transition(next) {
        warn!(run_id = %run.run_id, error = %e, "Unexpected run state transition");
    }
}

/// A pull-request side whose repository is gone has no clone URL; the error
/// names the side and its ref instead.
fn missing_repository(side: &str, git_ref: &str) -> PipelineError {
    PipelineError::Fetch {
        url: format!("{} repository of {}", side, git_ref),
        reason: "repository no longer exists".to_string(),
    }
}
