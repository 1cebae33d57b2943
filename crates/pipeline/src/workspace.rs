// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! Isolated workspaces for checked-out revisions.
//!
//! Each workspace is a directory directly under the scratch root, named by a
//! random identifier of 16 lowercase alphanumerics (36^16, about 8e24 names).
//! Lowercase keeps names distinct on case-insensitive filesystems. The
//! directory is created exclusively, so a name that already exists on disk is
//! never reused; the chance of drawing one is negligible and a fresh name is
//! drawn when it happens.

use crate::command::{self, CommandError, CommandSpec};
use crate::error::{PipelineError, Result};
use crate::event::Revision;
use async_trait::async_trait;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Length of generated workspace identifiers.
pub const ID_LEN: usize = 16;

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Attempts at drawing an unused identifier before giving up.
const CREATE_ATTEMPTS: usize = 4;

/// A checked-out revision lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    id: String,
    path: PathBuf,
}

impl Workspace {
    /// Workspace identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// External tools used to populate a workspace.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Version-control program.
    pub git: String,
    /// Dependency install command line, run inside the workspace.
    pub install: CommandSpec,
    /// Deadline for clone plus checkout, each.
    pub fetch_timeout: Duration,
    /// Deadline for the dependency install.
    pub install_timeout: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            install: CommandSpec::new("npm").arg("i").arg("--quiet"),
            fetch_timeout: Duration::from_secs(300),
            install_timeout: Duration::from_secs(600),
        }
    }
}

/// Fills a fresh workspace with a revision ready to benchmark.
#[async_trait]
pub trait RevisionProvisioner: Send + Sync {
    /// Check out `revision` into `workspace` and install its dependencies.
    async fn provision(&self, workspace: &Workspace, revision: &Revision) -> Result<()>;
}

/// Creates, populates and removes workspaces under one scratch root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    tools: ToolConfig,
}

impl WorkspaceManager {
    /// Manager for workspaces under `root`. The root is created on demand.
    pub fn new(root: impl Into<PathBuf>, tools: ToolConfig) -> Self {
        Self {
            root: root.into(),
            tools,
        }
    }

    /// Scratch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Draw a random workspace identifier.
    pub fn generate_id() -> String {
        let mut rng = rand::thread_rng();
        (0..ID_LEN)
            .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect()
    }

    /// Allocate a new, empty workspace.
    ///
    /// With `id`, that exact name is used and must not exist yet. Without, a
    /// random one is drawn.
    pub async fn create_workspace(&self, id: Option<&str>) -> Result<Workspace> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| PipelineError::Workspace {
                path: self.root.clone(),
                source,
            })?;

        if let Some(id) = id {
            if !is_valid_id(id) {
                return Err(PipelineError::Workspace {
                    path: self.root.join(id),
                    source: io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "workspace id must be non-empty ASCII alphanumerics, '-' or '_'",
                    ),
                });
            }
            return self.create_exclusive(id).await;
        }

        let mut last_err = None;
        for _ in 0..CREATE_ATTEMPTS {
            match self.create_exclusive(&Self::generate_id()).await {
                Err(PipelineError::Workspace { path, source })
                    if source.kind() == io::ErrorKind::AlreadyExists =>
                {
                    debug!(path = %path.display(), "Workspace id collision, drawing another");
                    last_err = Some(PipelineError::Workspace { path, source });
                }
                other => return other,
            }
        }
        Err(last_err.unwrap_or_else(|| PipelineError::Workspace {
            path: self.root.clone(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "no free workspace id"),
        }))
    }

    async fn create_exclusive(&self, id: &str) -> Result<Workspace> {
        let path = self.root.join(id);
        tokio::fs::create_dir(&path)
            .await
            .map_err(|source| PipelineError::Workspace {
                path: path.clone(),
                source,
            })?;
        info!(workspace_id = %id, path = %path.display(), "Workspace created");
        Ok(Workspace {
            id: id.to_string(),
            path,
        })
    }

    /// Clone `revision.clone_url` into the workspace and check out its ref.
    pub async fn materialize_revision(
        &self,
        workspace: &Workspace,
        revision: &Revision,
    ) -> Result<()> {
        let clone = CommandSpec::new(&self.tools.git)
            .arg("clone")
            .arg("--quiet")
            .arg(&revision.clone_url)
            .arg(".");
        command::run(&clone, workspace.path(), self.tools.fetch_timeout)
            .await
            .map_err(|e| PipelineError::Fetch {
                url: revision.clone_url.clone(),
                reason: e.to_string(),
            })?;

        let checkout = CommandSpec::new(&self.tools.git)
            .arg("checkout")
            .arg("--quiet")
            .arg(&revision.git_ref);
        command::run(&checkout, workspace.path(), self.tools.fetch_timeout)
            .await
            .map_err(|e| PipelineError::Checkout {
                git_ref: revision.git_ref.clone(),
                reason: e.to_string(),
            })?;

        info!(
            workspace_id = %workspace.id(),
            url = %revision.clone_url,
            git_ref = %revision.git_ref,
            "Revision checked out"
        );
        Ok(())
    }

    /// Run the install command inside the workspace.
    pub async fn install_dependencies(&self, workspace: &Workspace) -> Result<()> {
        let output = command::run(&self.tools.install, workspace.path(), self.tools.install_timeout)
            .await
            .map_err(|e: CommandError| PipelineError::Dependency {
                workspace_id: workspace.id().to_string(),
                reason: e.to_string(),
            })?;
        info!(
            workspace_id = %workspace.id(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Dependencies installed"
        );
        Ok(())
    }

    /// Remove the workspace and everything in it.
    ///
    /// Succeeds when the directory is already gone.
    pub async fn destroy_workspace(&self, workspace: &Workspace) -> io::Result<()> {
        match tokio::fs::remove_dir_all(workspace.path()).await {
            Ok(()) => {
                info!(workspace_id = %workspace.id(), "Workspace removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RevisionProvisioner for WorkspaceManager {
    async fn provision(&self, workspace: &Workspace, revision: &Revision) -> Result<()> {
        self.materialize_revision(workspace, revision).await?;
        self.install_dependencies(workspace).await
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
