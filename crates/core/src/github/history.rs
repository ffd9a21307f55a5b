//! Walks remote history from the branch head back to the merge base.

use tracing::{debug, info, instrument, warn};

use super::client::GitHubRemote;
use crate::errors::GitHubError;

/// Upper bound on history pages requested in one walk.
pub const MAX_HISTORY_PAGES: u32 = 1000;

/// Commits on `branch` after `base`, newest first.
///
/// Resolves the branch head, then pages back through history until `base`
/// shows up. `base` itself is never included.
#[instrument(skip(remote), fields(repo = %remote.repo()))]
pub async fn walk_history(
    remote: &GitHubRemote,
    base: &str,
    branch: &str,
) -> Result<Vec<String>, GitHubError> {
    let head = remote.branch_head(branch).await?;
    info!(branch, head = %head, "resolved remote branch head");
    commits_between(remote, base, &head).await
}

/// Commits reachable from `head` down to (excluding) `base`, newest first.
///
/// Pages are requested one at a time; the next page is only fetched once the
/// current one has been checked for `base`. The walk also ends on an empty
/// page, so a `base` that is not in the remote history (e.g. after a force
/// push) still terminates, as does hitting [`MAX_HISTORY_PAGES`].
pub async fn commits_between(
    remote: &GitHubRemote,
    base: &str,
    head: &str,
) -> Result<Vec<String>, GitHubError> {
    commits_between_capped(remote, base, head, MAX_HISTORY_PAGES).await
}

/// [`commits_between`] with an explicit page cap.
pub async fn commits_between_capped(
    remote: &GitHubRemote,
    base: &str,
    head: &str,
    max_pages: u32,
) -> Result<Vec<String>, GitHubError> {
    let mut commits = Vec::new();

    for page in 1..=max_pages {
        let shas = remote.commits_page(head, page).await?;
        if shas.is_empty() {
            warn!(page, base, "reached end of remote history without finding merge base");
            return Ok(commits);
        }

        match shas.iter().position(|sha| sha == base) {
            Some(idx) => {
                commits.extend(shas.into_iter().take(idx));
                info!(count = commits.len(), pages = page, "walked remote history");
                return Ok(commits);
            }
            None => {
                debug!(page, count = shas.len(), "merge base not on page, continuing");
                commits.extend(shas);
            }
        }
    }

    warn!(
        max_pages,
        count = commits.len(),
        "history page limit reached before merge base"
    );
    Ok(commits)
}
