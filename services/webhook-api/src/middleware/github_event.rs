// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! GitHub delivery headers.
//!
//! Every webhook delivery names its event type in `x-github-event` and carries
//! a unique `x-github-delivery` id. Handlers take a [`GithubEvent`] to read
//! both; a request without the event header is rejected with `400`.

use crate::models::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

/// Header names.
pub mod headers {
    /// Event type, e.g. `pull_request`, `push` or `ping`.
    pub const X_GITHUB_EVENT: &str = "x-github-event";
    /// Unique id of the delivery.
    pub const X_GITHUB_DELIVERY: &str = "x-github-delivery";
}

/// The event type and delivery id of a webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubEvent {
    /// Value of `x-github-event`.
    pub kind: String,
    /// Value of `x-github-delivery`, when sent.
    pub delivery_id: Option<String>,
}

impl GithubEvent {
    /// Whether this is a `pull_request` event.
    pub fn is_pull_request(&self) -> bool {
        self.kind == "pull_request"
    }
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for GithubEvent
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let kind = header(headers::X_GITHUB_EVENT).ok_or_else(|| {
            ApiError::bad_request(
                "MISSING_EVENT_HEADER",
                format!("Header '{}' is required", headers::X_GITHUB_EVENT),
            )
        })?;
        let delivery_id = header(headers::X_GITHUB_DELIVERY);

        debug!(event = %kind, delivery_id = ?delivery_id, "Webhook delivery received");
        Ok(Self { kind, delivery_id })
    }
}
