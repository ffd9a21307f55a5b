//! Detector configuration.
//!
//! [`DetectorConfig`] is the immutable value the pipeline runs against. It can
//! be built directly or assembled from a TOML [`ConfigFile`], whose secrets are
//! stored as `_env` fields naming environment variables and resolved at
//! runtime via [`ConfigFile::resolve_env_vars`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default name of the remote whose tracking refs are used for the merge base.
pub const DEFAULT_REMOTE: &str = "origin";

// ---------------------------------------------------------------------------
// Runtime config
// ---------------------------------------------------------------------------

/// Everything one detection run needs.
///
/// `remote_branch` is the branch on GitHub ("branch A"); `local_branch` is the
/// checked-out side ("branch B").
#[derive(Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub local_repo_path: String,
    pub remote_branch: String,
    pub local_branch: String,
    /// GitHub API base URL (default [`DEFAULT_API_URL`]).
    pub api_url: String,
    /// Remote name used to form the tracking ref (default [`DEFAULT_REMOTE`]).
    pub remote: String,
}

impl DetectorConfig {
    /// Create a config against the public GitHub API and the `origin` remote.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        local_repo_path: impl Into<String>,
        remote_branch: impl Into<String>,
        local_branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            local_repo_path: local_repo_path.into(),
            remote_branch: remote_branch.into(),
            local_branch: local_branch.into(),
            api_url: DEFAULT_API_URL.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// The remote-tracking ref of the remote branch, e.g. `origin/main`.
    pub fn remote_ref(&self) -> String {
        format!("{}/{}", self.remote, self.remote_branch)
    }

    /// Check required fields in a fixed order and return the first violation.
    ///
    /// Order: owner, repository, token, local path, branch A, branch B, then
    /// existence of the local path on disk.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (&self.owner, ConfigError::MissingOwner),
            (&self.repo, ConfigError::MissingRepo),
            (&self.token, ConfigError::MissingToken),
            (&self.local_repo_path, ConfigError::MissingLocalPath),
            (&self.remote_branch, ConfigError::MissingRemoteBranch),
            (&self.local_branch, ConfigError::MissingLocalBranch),
        ];
        for (value, err) in required {
            if value.trim().is_empty() {
                return Err(err);
            }
        }

        if !Path::new(&self.local_repo_path).exists() {
            return Err(ConfigError::LocalPathNotFound(self.local_repo_path.clone()));
        }

        Ok(())
    }
}

impl fmt::Debug for DetectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("local_repo_path", &self.local_repo_path)
            .field("remote_branch", &self.remote_branch)
            .field("local_branch", &self.local_branch)
            .field("api_url", &self.api_url)
            .field("remote", &self.remote)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TOML file
// ---------------------------------------------------------------------------

/// Configuration loaded from a TOML file.
///
/// Every field is optional so that command-line flags can fill the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub github: GitHubSection,

    #[serde(default)]
    pub local: LocalSection,
}

/// `[github]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubSection {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub repo: Option<String>,

    /// Environment variable holding the personal access token.
    #[serde(default)]
    pub token_env: Option<String>,

    /// Branch on GitHub to compare against ("branch A").
    #[serde(default)]
    pub branch: Option<String>,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

/// `[local]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalSection {
    /// Path to the local repository.
    #[serde(default)]
    pub path: Option<String>,

    /// Local branch to compare ("branch B").
    #[serde(default)]
    pub branch: Option<String>,

    /// Remote name for the tracking ref (default `origin`).
    #[serde(default)]
    pub remote: Option<String>,
}

impl ConfigFile {
    /// Load a [`ConfigFile`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ConfigFile =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `github.token_env` into `github.token`.
    ///
    /// A named variable that is unset is an error; no `token_env` at all is
    /// fine, since the token may come from elsewhere.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref env_name) = self.github.token_env {
            match resolve_optional_env(env_name, "github.token_env") {
                Some(token) => self.github.token = Some(token),
                None => {
                    return Err(ConfigError::EnvVarMissing {
                        var: env_name.clone(),
                        field: "github.token_env".into(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Convenience: load and resolve in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
