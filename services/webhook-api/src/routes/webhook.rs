// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use benchbot_pipeline::PullRequestEvent;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::middleware::GithubEvent;
use crate::models::{ApiError, AppState, HookResponse};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/github-hook", post(receive_hook))
}

async fn receive_hook(
    State(state): State<Arc<AppState>>,
    event: GithubEvent,
    body: Bytes,
) -> Result<Response, ApiError> {
    if !event.is_pull_request() {
        info!(
            event = %event.kind,
            delivery_id = ?event.delivery_id,
            "Webhook event ignored"
        );
        return Ok(ignored(event.kind, None));
    }

    let payload: PullRequestEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(delivery_id = ?event.delivery_id, error = %e, "Malformed pull_request payload");
        ApiError::bad_request("INVALID_PAYLOAD", format!("Invalid pull_request payload: {}", e))
    })?;
    let pr_number = payload.number;

    if !payload.action.triggers_benchmark() {
        info!(
            pr_number,
            action = ?payload.action,
            delivery_id = ?event.delivery_id,
            "Pull request action ignored"
        );
        return Ok(ignored(event.kind, Some(pr_number)));
    }

    info!(
        pr_number,
        action = ?payload.action,
        delivery_id = ?event.delivery_id,
        "Pull request event accepted"
    );

    let orchestrator = state.orchestrator.clone();
    state.tasks.spawn(async move {
        match orchestrator.handle_pull_request_event(&payload).await {
            Ok(run) => debug!(pr_number, run_id = %run.run_id, "Event task finished"),
            Err(e) => debug!(pr_number, stage = %e.stage, "Event task finished with error"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(HookResponse {
            status: "accepted",
            event: event.kind,
            pr_number: Some(pr_number),
        }),
    )
        .into_response())
}

fn ignored(event: String, pr_number: Option<u64>) -> Response {
    (
        StatusCode::OK,
        Json(HookResponse {
            status: "ignored",
            event,
            pr_number,
        }),
    )
        .into_response()
}
