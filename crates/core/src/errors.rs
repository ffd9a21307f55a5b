//! Error types for the gitconflict core library.
//!
//! Each pipeline stage has its own error type derived with `thiserror`, and a
//! top-level [`DetectorError`] enum unifies them for callers that want a
//! single error type. The display strings are part of the observable
//! contract: [`crate::ConflictDetector::detect`] reports them verbatim.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the detection pipeline.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    MergeBase(#[from] MergeBaseError),

    #[error(transparent)]
    LocalChanges(#[from] LocalChangesError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
///
/// Validation variants are ordered the way [`crate::DetectorConfig::validate`]
/// checks them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Owner is required")]
    MissingOwner,

    #[error("Repository name is required")]
    MissingRepo,

    #[error("Access token is required")]
    MissingToken,

    #[error("Local repository path is required")]
    MissingLocalPath,

    #[error("Branch A name is required")]
    MissingRemoteBranch,

    #[error("Branch B name is required")]
    MissingLocalBranch,

    #[error("Local repository path does not exist: {0}")]
    LocalPathNotFound(String),

    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Local command errors
// ---------------------------------------------------------------------------

/// Errors from running a local `git` command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started at all.
    #[error("Git command failed: {command} - {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited with a non-zero status.
    #[error("Git command failed with exit code {exit_code}: {stderr}")]
    Failed { exit_code: i32, stderr: String },
}

/// Errors from validating the local repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The path is not a git work tree, or `git` could not be run there.
    #[error("Invalid git repository at {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: CommandError,
    },

    #[error("Branch '{0}' does not exist locally")]
    BranchMissing(String),
}

/// Errors from resolving the common ancestor.
#[derive(Debug, Error)]
pub enum MergeBaseError {
    #[error("Failed to find merge base: Could not find merge base between {remote_ref} and {local_branch}")]
    Empty {
        remote_ref: String,
        local_branch: String,
    },

    #[error("Failed to find merge base: {0}")]
    Command(#[from] CommandError),
}

/// Errors from extracting the local change set.
#[derive(Debug, Error)]
#[error("Failed to get local changes: {0}")]
pub struct LocalChangesError(#[from] pub CommandError);

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub REST API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),

    /// A concurrent commit fetch panicked or was aborted.
    #[error("GitHub fetch task failed: {0}")]
    TaskFailed(String),
}

impl From<serde_json::Error> for GitHubError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
