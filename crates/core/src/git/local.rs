//! Read-only operations on the local repository, built on a [`CommandRunner`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::runner::CommandRunner;
use crate::errors::{CommandError, LocalChangesError, MergeBaseError, RepoError};
use crate::models::{ChangeSet, ChangeStatus, FileChange};

/// The local side of a comparison.
pub struct LocalRepo<'r> {
    runner: &'r dyn CommandRunner,
    path: PathBuf,
}

impl<'r> LocalRepo<'r> {
    pub fn new(runner: &'r dyn CommandRunner, path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Confirm the path is a work tree and `branch` exists locally.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn validate(&self, branch: &str) -> Result<(), RepoError> {
        let invalid = |source| RepoError::Invalid {
            path: self.path.display().to_string(),
            source,
        };

        self.git(&["rev-parse", "--is-inside-work-tree"])
            .map_err(invalid)?;
        let listing = self.git(&["branch", "--list"]).map_err(invalid)?;

        let branches = parse_branch_list(&listing);
        if !branches.iter().any(|b| b == branch) {
            return Err(RepoError::BranchMissing(branch.to_string()));
        }

        debug!(branch, count = branches.len(), "local branch found");
        Ok(())
    }

    /// Common ancestor of `remote_ref` and `local_branch`.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn merge_base(&self, remote_ref: &str, local_branch: &str) -> Result<String, MergeBaseError> {
        let output = self.git(&["merge-base", remote_ref, local_branch])?;
        let base = output.trim();
        if base.is_empty() {
            return Err(MergeBaseError::Empty {
                remote_ref: remote_ref.to_string(),
                local_branch: local_branch.to_string(),
            });
        }

        info!(merge_base = base, "found merge base");
        Ok(base.to_string())
    }

    /// Files that differ between `base` and the tip of `branch`, with their
    /// blob SHAs at the tip.
    ///
    /// A path in the diff but missing from the tip tree was deleted and is
    /// reported as [`ChangeStatus::Removed`] without a SHA. Both listings use
    /// `-z`, so paths arrive verbatim (no C-quoting, no trimming).
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn local_changes(&self, base: &str, branch: &str) -> Result<ChangeSet, LocalChangesError> {
        let diff = self.git(&["diff", "--name-only", "-z", base, branch])?;
        let changed = parse_name_list(&diff);
        if changed.is_empty() {
            debug!("no local changes since merge base");
            return Ok(ChangeSet::new());
        }

        let tree = self.git(&["ls-tree", "-r", "-z", branch])?;

        let mut pending: HashSet<&str> = changed.iter().copied().collect();
        let mut changes = ChangeSet::new();
        for (sha, filename) in parse_ls_tree(&tree) {
            if pending.remove(filename) {
                changes.push(FileChange::new(
                    filename,
                    ChangeStatus::Modified,
                    Some(sha.to_string()),
                ));
            }
        }

        // Whatever is left was deleted on this branch.
        let mut removed = 0usize;
        for filename in changed {
            if pending.remove(filename) {
                changes.push(FileChange::new(filename, ChangeStatus::Removed, None));
                removed += 1;
            }
        }

        info!(count = changes.len(), removed, "collected local changes");
        Ok(changes)
    }

    fn git(&self, args: &[&str]) -> Result<String, CommandError> {
        let output = self.runner.run(&self.path, args)?;
        if !output.success() {
            warn!(
                cmd = %format!("git {}", args.join(" ")),
                exit_code = output.exit_code,
                stderr = %output.stderr,
                "git command failed"
            );
            return Err(CommandError::Failed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

/// Branch names from `git branch --list`, with the current-branch (`*`) and
/// linked-worktree (`+`) markers stripped.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix(['*', '+'])
                .map(str::trim_start)
                .unwrap_or(line)
        })
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Paths from a NUL-separated listing such as `git diff --name-only -z`.
pub fn parse_name_list(output: &str) -> Vec<&str> {
    output.split('\0').filter(|p| !p.is_empty()).collect()
}

/// `(sha, path)` pairs from `git ls-tree -r -z`.
///
/// Records are `<mode> <type> <object>\t<path>`, NUL-terminated.
pub fn parse_ls_tree(output: &str) -> Vec<(&str, &str)> {
    output
        .split('\0')
        .filter_map(|record| {
            let (meta, path) = record.split_once('\t')?;
            let sha = meta.split_whitespace().nth(2)?;
            Some((sha, path))
        })
        .collect()
}
