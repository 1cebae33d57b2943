// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared state and response types.

use crate::config::Settings;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use benchbot_pipeline::{GitHubPublisher, Orchestrator, SuiteRunner, WorkspaceManager};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// State shared by every request handler.
///
/// Built once at startup; the HTTP client and credential inside the
/// orchestrator's publisher are reused for every event.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline accepted events are handed to.
    pub orchestrator: Arc<Orchestrator>,
    /// Background event runs still in flight.
    pub tasks: TaskTracker,
}

impl AppState {
    /// State around an existing orchestrator.
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            tasks: TaskTracker::new(),
        }
    }

    /// Stop accepting event runs and wait for the running ones, including
    /// their workspace cleanup.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Wire the production pipeline from validated settings.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let workspaces = Arc::new(WorkspaceManager::new(
            settings.scratch_root.clone(),
            settings.tool_config()?,
        ));
        let runner = Arc::new(SuiteRunner::new(
            settings.suite_filename.clone(),
            settings.interpreter()?,
            settings.run_timeout(),
        ));
        let publisher = Arc::new(GitHubPublisher::new(
            settings.github_api_url.clone(),
            settings.repo_owner.clone(),
            settings.repo_name.clone(),
            settings.github_token.clone(),
        )?);
        Ok(Self::new(Orchestrator::new(workspaces, runner, publisher)))
    }
}

/// Acknowledgement body for webhook deliveries.
#[derive(Debug, Serialize)]
pub struct HookResponse {
    /// `accepted` or `ignored`.
    pub status: &'static str,
    /// Value of the event header.
    pub event: String,
    /// Pull-request number, for pull-request events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
}

/// Error response.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status.
    pub status: StatusCode,
    /// Machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// A `400 Bad Request` error.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            },
            "meta": {
                "timestamp": Utc::now().to_rfc3339(),
            }
        }));
        (self.status, body).into_response()
    }
}
