//! Potential-conflict detection pipeline.
//!
//! The [`ConflictDetector`] runs one detection as a fixed sequence of stages:
//!
//! 1. Validate the configuration.
//! 2. Validate the local repository and branch.
//! 3. Resolve the merge base of `<remote>/<branch A>` and branch B.
//! 4. Collect local changes since the merge base.
//! 5. Collect remote changes: resolve the head, walk history back to the
//!    merge base, fetch each commit's files.
//! 6. Reconcile the two change sets.
//!
//! Any failure ends the run. [`ConflictDetector::detect`] never returns an
//! error; failures are carried in [`ConflictReport::error`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::conflict::reconcile;
use crate::errors::{DetectorError, GitHubError};
use crate::git::{CommandRunner, LocalRepo, SystemCommandRunner};
use crate::github::{fetch_remote_changes, walk_history, GitHubRemote, HttpRemoteApi, RemoteApi};
use crate::models::{ChangeSet, ConflictReport};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Stages of a detection run, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStage {
    ValidateConfig,
    ValidateLocalRepo,
    ResolveMergeBase,
    LocalScan,
    RemoteScan,
    Reconcile,
    Done,
}

impl std::fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidateConfig => write!(f, "validate_config"),
            Self::ValidateLocalRepo => write!(f, "validate_local_repo"),
            Self::ResolveMergeBase => write!(f, "resolve_merge_base"),
            Self::LocalScan => write!(f, "local_scan"),
            Self::RemoteScan => write!(f, "remote_scan"),
            Self::Reconcile => write!(f, "reconcile"),
            Self::Done => write!(f, "done"),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Detects files changed on both a local branch and a GitHub branch since
/// their merge base.
pub struct ConflictDetector {
    config: DetectorConfig,
    runner: Arc<dyn CommandRunner>,
    api: Arc<dyn RemoteApi>,
}

impl ConflictDetector {
    /// Detector using the system `git` and the GitHub API named in `config`.
    pub fn new(config: DetectorConfig) -> Result<Self, GitHubError> {
        let api = HttpRemoteApi::new(&config.api_url, &config.token)?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(SystemCommandRunner::new()),
            Arc::new(api),
        ))
    }

    /// Detector with explicit collaborators, e.g. scripted mocks.
    pub fn with_collaborators(
        config: DetectorConfig,
        runner: Arc<dyn CommandRunner>,
        api: Arc<dyn RemoteApi>,
    ) -> Self {
        Self {
            config,
            runner,
            api,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run one detection.
    pub async fn detect(&self) -> ConflictReport {
        match self.run().await {
            Ok(report) => report,
            Err(err) => {
                let message = failure_message(&err);
                warn!(error = %message, "conflict detection failed");
                ConflictReport::failure(message)
            }
        }
    }

    async fn run(&self) -> Result<ConflictReport, DetectorError> {
        let config = &self.config;
        info!(
            owner = %config.owner,
            repo = %config.repo,
            remote_branch = %config.remote_branch,
            local_branch = %config.local_branch,
            "starting conflict detection"
        );

        enter(DetectionStage::ValidateConfig);
        config.validate()?;

        enter(DetectionStage::ValidateLocalRepo);
        let local = LocalRepo::new(self.runner.as_ref(), &config.local_repo_path);
        local.validate(&config.local_branch)?;

        enter(DetectionStage::ResolveMergeBase);
        let merge_base = local.merge_base(&config.remote_ref(), &config.local_branch)?;

        // The two scans are independent; the local one is synchronous and
        // finishes before the remote one starts.
        enter(DetectionStage::LocalScan);
        let local_changes = local.local_changes(&merge_base, &config.local_branch)?;

        enter(DetectionStage::RemoteScan);
        let remote_changes = self.remote_changes(&merge_base).await?;

        enter(DetectionStage::Reconcile);
        let conflicts = reconcile(&local_changes, &remote_changes);

        enter(DetectionStage::Done);
        info!(
            merge_base = %merge_base,
            conflicts = conflicts.len(),
            "conflict detection complete"
        );
        Ok(ConflictReport::success(merge_base, conflicts))
    }

    async fn remote_changes(&self, merge_base: &str) -> Result<ChangeSet, GitHubError> {
        let remote = GitHubRemote::new(self.api.clone(), &self.config.owner, &self.config.repo);
        let commits = walk_history(&remote, merge_base, &self.config.remote_branch).await?;
        info!(commits = commits.len(), "remote commits since merge base");
        fetch_remote_changes(&remote, &commits).await
    }
}

impl std::fmt::Debug for ConflictDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictDetector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Detect with the production collaborators for `config`.
pub async fn detect(config: &DetectorConfig) -> ConflictReport {
    match ConflictDetector::new(config.clone()) {
        Ok(detector) => detector.detect().await,
        Err(err) => ConflictReport::failure(failure_message(&err.into())),
    }
}

fn enter(stage: DetectionStage) {
    debug!(stage = %stage, "entering stage");
}

/// User-facing message for a failed run. Remote failures are prefixed so the
/// reader knows which side broke.
fn failure_message(err: &DetectorError) -> String {
    match err {
        DetectorError::GitHub(e) => format!("Error getting remote changes: {}", e),
        other => other.to_string(),
    }
}
