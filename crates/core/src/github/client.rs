//! Typed GitHub REST calls used by the remote scan.

use std::sync::Arc;

use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};

use super::api::{ApiResponse, RemoteApi};
use crate::errors::GitHubError;
use crate::models::{ChangeStatus, FileChange};

/// Commits per page when listing history.
pub const HISTORY_PAGE_SIZE: u32 = 100;

/// GitHub's cap on files per commit response.
pub const COMMIT_FILES_PAGE_SIZE: usize = 300;

/// `GET /repos/{owner}/{repo}/branches/{branch}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubBranch {
    pub commit: GitHubCommitRef,
}

/// A commit reference carrying only its SHA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommitRef {
    pub sha: String,
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`, restricted to the file list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubCommitFiles {
    #[serde(default)]
    pub files: Vec<GitHubFile>,
}

/// One entry of a commit's `files` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub sha: Option<String>,
}

impl From<GitHubFile> for FileChange {
    fn from(file: GitHubFile) -> Self {
        FileChange::new(file.filename, ChangeStatus::from_github(&file.status), file.sha)
    }
}

/// One repository on GitHub, reached through a [`RemoteApi`].
#[derive(Clone)]
pub struct GitHubRemote {
    api: Arc<dyn RemoteApi>,
    owner: String,
    repo: String,
}

impl GitHubRemote {
    pub fn new(api: Arc<dyn RemoteApi>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// SHA at the tip of `branch`.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn branch_head(&self, branch: &str) -> Result<String, GitHubError> {
        let mut segments = vec!["branches"];
        segments.extend(branch.split('/'));
        let path = self.repo_path(&segments)?;
        let branch_info: GitHubBranch = self.get_json(&path, &[]).await?;
        debug!(branch, head = %branch_info.commit.sha, "resolved branch head");
        Ok(branch_info.commit.sha)
    }

    /// One page (1-based) of history reachable from `head`, newest first.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn commits_page(&self, head: &str, page: u32) -> Result<Vec<String>, GitHubError> {
        let path = self.repo_path(&["commits"])?;
        let query = [
            ("sha", head.to_string()),
            ("per_page", HISTORY_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        let commits: Vec<GitHubCommitRef> = self.get_json(&path, &query).await?;
        debug!(page, count = commits.len(), "fetched commits page");
        Ok(commits.into_iter().map(|c| c.sha).collect())
    }

    /// Files changed by commit `sha`.
    ///
    /// `page = None` is the plain commit request; `Some(p)` asks for page `p`
    /// of a commit whose file list was truncated.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn commit_files(
        &self,
        sha: &str,
        page: Option<u32>,
    ) -> Result<Vec<FileChange>, GitHubError> {
        let path = self.repo_path(&["commits", sha])?;
        let query = match page {
            Some(p) => vec![
                ("page", p.to_string()),
                ("per_page", COMMIT_FILES_PAGE_SIZE.to_string()),
            ],
            None => Vec::new(),
        };
        let commit: GitHubCommitFiles = self.get_json(&path, &query).await?;
        debug!(sha, ?page, count = commit.files.len(), "fetched commit files");
        Ok(commit.files.into_iter().map(FileChange::from).collect())
    }

    /// `/repos/{owner}/{repo}/{rest..}` with every segment percent-encoded,
    /// so `#`, `?` and `%` in a branch name stay part of the path.
    fn repo_path(&self, rest: &[&str]) -> Result<String, GitHubError> {
        let mut url = Url::parse("http://localhost/")
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| GitHubError::ParseError("URL cannot carry a path".into()))?
            .clear()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(rest);
        Ok(url.path().to_string())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let resp = self.api.get(path, query).await?;
        check_response(&resp)?;
        Ok(serde_json::from_str(&resp.body)?)
    }
}

impl std::fmt::Debug for GitHubRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubRemote")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

fn check_response(resp: &ApiResponse) -> Result<(), GitHubError> {
    if resp.is_success() {
        return Ok(());
    }
    Err(GitHubError::ApiError {
        status: resp.status,
        body: resp.body.clone(),
    })
}
