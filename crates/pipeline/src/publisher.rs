// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Publishing sinks for rendered reports.

use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = concat!("benchbot/", env!("CARGO_PKG_VERSION"));

/// Receives the rendered report of a pull request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `body` for pull request `pr_number`.
    async fn publish(&self, pr_number: u64, body: &str) -> Result<()>;
}

/// Posts reports as pull-request comments through the GitHub REST API.
///
/// Construct once at startup; the underlying HTTP client is reused.
#[derive(Debug, Clone)]
pub struct GitHubPublisher {
    client: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

impl GitHubPublisher {
    /// Publisher for `owner/repo` using `token`, against `api_url`
    /// (`https://api.github.com` or a GitHub Enterprise endpoint).
    pub fn new(
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        })
    }

    /// Endpoint comments for `pr_number` are posted to.
    pub fn comments_url(&self, pr_number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, pr_number
        )
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    async fn publish(&self, pr_number: u64, body: &str) -> Result<()> {
        let publish_err = |reason: String| PipelineError::Publish { pr_number, reason };

        let response = self
            .client
            .post(self.comments_url(pr_number))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&CommentRequest { body })
            .send()
            .await
            .map_err(|e| publish_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(publish_err(format!("GitHub answered {}: {}", status, text)));
        }

        info!(
            pr_number,
            owner = %self.owner,
            repo = %self.repo,
            "Report posted as pull-request comment"
        );
        Ok(())
    }
}

/// Writes reports to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutPublisher;

#[async_trait]
impl Publisher for StdoutPublisher {
    async fn publish(&self, pr_number: u64, body: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(body.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| PipelineError::Publish {
                pr_number,
                reason: e.to_string(),
            })
    }
}
