// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pull-request webhook payloads.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! GitHub payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// What happened to the pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    /// A pull request was opened.
    Opened,
    /// New commits were pushed to the head branch.
    Synchronize,
    /// Any other action (`closed`, `edited`, `labeled`, ...).
    #[serde(other)]
    Other,
}

impl PullRequestAction {
    /// Whether this action should run the benchmarks.
    pub fn triggers_benchmark(&self) -> bool {
        matches!(self, Self::Opened | Self::Synchronize)
    }
}

/// A `pull_request` webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// Action that triggered the event.
    pub action: PullRequestAction,
    /// Pull-request number.
    pub number: u64,
    /// The pull request itself.
    pub pull_request: PullRequest,
}

/// The pull-request object of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Proposed branch.
    pub head: Branch,
    /// Target branch.
    pub base: Branch,
}

/// One side of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Repository holding the branch; `null` when a fork was deleted.
    #[serde(default)]
    pub repo: Option<Repository>,
}

/// Repository of a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// URL to clone from.
    pub clone_url: String,
    /// `owner/name`.
    #[serde(default)]
    pub full_name: String,
}

/// Something that can be checked out: a clone URL and a ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// URL to clone from.
    pub clone_url: String,
    /// Branch or ref to check out.
    pub git_ref: String,
}

impl Revision {
    /// Create a revision.
    pub fn new(clone_url: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            clone_url: clone_url.into(),
            git_ref: git_ref.into(),
        }
    }
}

impl Branch {
    /// The revision to check out, if the repository still exists.
    pub fn revision(&self) -> Option<Revision> {
        self.repo
            .as_ref()
            .map(|repo| Revision::new(&repo.clone_url, &self.git_ref))
    }
}

impl PullRequestEvent {
    /// The base (target) revision.
    pub fn base_revision(&self) -> Option<Revision> {
        self.pull_request.base.revision()
    }

    /// The head (candidate) revision.
    pub fn head_revision(&self) -> Option<Revision> {
        self.pull_request.head.revision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(action: &str) -> serde_json::Value {
        json!({
            "action": action,
            "number": 17,
            "sender": { "login": "someone" },
            "pull_request": {
                "title": "Speed up parser",
                "head": {
                    "ref": "fast-parser",
                    "sha": "abc123",
                    "repo": {
                        "clone_url": "https://github.com/fork/proj.git",
                        "full_name": "fork/proj"
                    }
                },
                "base": {
                    "ref": "master",
                    "repo": {
                        "clone_url": "https://github.com/owner/proj.git",
                        "full_name": "owner/proj"
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_github_payload() {
        let event: PullRequestEvent = serde_json::from_value(payload("opened")).unwrap();
        assert_eq!(event.number, 17);
        assert_eq!(event.action, PullRequestAction::Opened);
        assert_eq!(
            event.head_revision(),
            Some(Revision::new("https://github.com/fork/proj.git", "fast-parser"))
        );
        assert_eq!(
            event.base_revision(),
            Some(Revision::new("https://github.com/owner/proj.git", "master"))
        );
    }

    #[test]
    fn test_only_opened_and_synchronize_trigger() {
        for (action, triggers) in [
            ("opened", true),
            ("synchronize", true),
            ("closed", false),
            ("reopened", false),
            ("labeled", false),
        ] {
            let event: PullRequestEvent = serde_json::from_value(payload(action)).unwrap();
            assert_eq!(event.action.triggers_benchmark(), triggers, "{action}");
        }
    }

    #[test]
    fn test_deleted_fork_has_no_revision() {
        let mut value = payload("synchronize");
        value["pull_request"]["head"]["repo"] = serde_json::Value::Null;
        let event: PullRequestEvent = serde_json::from_value(value).unwrap();
        assert!(event.head_revision().is_none());
        assert!(event.base_revision().is_some());
    }
}
