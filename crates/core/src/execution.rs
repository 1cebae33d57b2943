// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-event run records for the benchmark pipeline.
//!
//! Every pull-request event that reaches the orchestrator gets an [`EventRun`].
//! The run moves through a fixed state machine and keeps an append-only log of
//! the transitions it made, so a failed event can be diagnosed from its record
//! alone.
//!
//! # State machine
//!
//! ```text
//! Idle ─┬─> ProvisioningBase -> RunningBase -> ProvisioningCandidate
//!       │     -> RunningCandidate -> Comparing -> Rendering -> Publishing
//!       │     -> CleaningUp -> Done
//!       └─> Ignored
//!
//! (any active state) -> Failed -> CleaningUp -> Done
//! ```
//!
//! `Done` and `Ignored` are terminal. A run that passed through `Failed` keeps
//! its error message and the state it failed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one event run.
pub type RunId = String;

/// Step of the pipeline a run is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created, nothing started yet.
    Idle,
    /// Creating the base workspace and checking out the base revision.
    ProvisioningBase,
    /// Running the suite against the base revision.
    RunningBase,
    /// Creating the candidate workspace and checking out the head revision.
    ProvisioningCandidate,
    /// Running the suite against the head revision.
    RunningCandidate,
    /// Diffing the two results.
    Comparing,
    /// Rendering the report.
    Rendering,
    /// Handing the report to the publishing sink.
    Publishing,
    /// Removing every workspace created for the event.
    CleaningUp,
    /// Finished (successfully or after a failure).
    Done,
    /// A step failed; cleanup follows.
    Failed,
    /// The event did not trigger the pipeline.
    Ignored,
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Idle
    }
}

impl RunState {
    /// Snake-case name used in logs and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ProvisioningBase => "provisioning_base",
            Self::RunningBase => "running_base",
            Self::ProvisioningCandidate => "provisioning_candidate",
            Self::RunningCandidate => "running_candidate",
            Self::Comparing => "comparing",
            Self::Rendering => "rendering",
            Self::Publishing => "publishing",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Ignored => "ignored",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Ignored)
    }

    /// Whether this is one of the working steps that may fail.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Idle
                | Self::ProvisioningBase
                | Self::RunningBase
                | Self::ProvisioningCandidate
                | Self::RunningCandidate
                | Self::Comparing
                | Self::Rendering
                | Self::Publishing
        )
    }

    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        use RunState::*;

        if next == Failed {
            return self.is_active();
        }

        matches!(
            (self, next),
            (Idle, ProvisioningBase)
                | (Idle, Ignored)
                | (ProvisioningBase, RunningBase)
                | (RunningBase, ProvisioningCandidate)
                | (ProvisioningCandidate, RunningCandidate)
                | (RunningCandidate, Comparing)
                | (Comparing, Rendering)
                | (Rendering, Publishing)
                | (Publishing, CleaningUp)
                | (Failed, CleaningUp)
                | (CleaningUp, Done)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a run's transition log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTransition {
    /// State left.
    pub from: RunState,
    /// State entered.
    pub to: RunState,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}

/// Record of one pull-request event moving through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRun {
    /// Unique run identifier (UUID v4 unless supplied).
    pub run_id: RunId,
    /// Pull-request number.
    pub pr_number: u64,
    /// Base branch ref.
    pub base_ref: String,
    /// Head (candidate) branch ref.
    pub head_ref: String,
    /// Current state.
    pub state: RunState,
    /// Identifiers of the workspaces created for this event, in creation order.
    #[serde(default)]
    pub workspace_ids: Vec<String>,
    /// Append-only transition log.
    #[serde(default)]
    pub transitions: Vec<RunTransition>,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// End time, set on reaching a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Duration in milliseconds, set with `end_time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// State the run was in when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_in: Option<RunState>,
    /// Error message when the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl EventRun {
    /// Create a run in the `Idle` state, starting now.
    pub fn new(pr_number: u64, base_ref: impl Into<String>, head_ref: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            pr_number,
            base_ref: base_ref.into(),
            head_ref: head_ref.into(),
            state: RunState::Idle,
            workspace_ids: Vec::new(),
            transitions: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            failed_in: None,
            error_message: None,
        }
    }

    /// Move to `next`, appending to the transition log.
    ///
    /// Returns [`crate::Error::InvalidTransition`] when the state machine has
    /// no such edge; the run is left unchanged in that case.
    pub fn transition(&mut self, next: RunState) -> crate::Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(crate::Error::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        let now = Utc::now();
        self.transitions.push(RunTransition {
            from: self.state,
            to: next,
            timestamp: now,
        });
        self.state = next;

        if next.is_terminal() {
            self.end_time = Some(now);
            self.duration_ms = Some(
                now.signed_duration_since(self.start_time)
                    .num_milliseconds()
                    .unsigned_abs(),
            );
        }
        Ok(())
    }

    /// Mark the run as failed in its current state.
    pub fn fail(&mut self, error: impl Into<String>) -> crate::Result<()> {
        let failed_in = self.state;
        self.transition(RunState::Failed)?;
        self.failed_in = Some(failed_in);
        self.error_message = Some(error.into());
        Ok(())
    }

    /// Remember a workspace created for this event.
    pub fn record_workspace(&mut self, workspace_id: impl Into<String>) {
        self.workspace_ids.push(workspace_id.into());
    }

    /// Whether the run went through `Failed`.
    pub fn is_failed(&self) -> bool {
        self.failed_in.is_some()
    }

    /// Whether the run reached `Done` without failing.
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Done && !self.is_failed()
    }

    /// States visited so far, starting with the initial one.
    pub fn visited_states(&self) -> Vec<RunState> {
        let mut states = Vec::with_capacity(self.transitions.len() + 1);
        states.push(
            self.transitions
                .first()
                .map(|t| t.from)
                .unwrap_or(self.state),
        );
        states.extend(self.transitions.iter().map(|t| t.to));
        states
    }
}
