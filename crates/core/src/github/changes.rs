//! Per-commit file fetching and aggregation into one remote change set.

use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use super::client::{GitHubRemote, COMMIT_FILES_PAGE_SIZE};
use crate::errors::GitHubError;
use crate::models::{ChangeSet, FileChange};

/// Highest file page requested for a single commit (GitHub serves at most
/// 3000 files per commit, 300 per page).
pub const MAX_COMMIT_FILE_PAGES: u32 = 10;

/// Fetch the files of every commit concurrently and merge them.
///
/// `commits` must be newest first. Aggregation walks the commits in that
/// order, not in completion order, and keeps the first change seen for each
/// filename, so the most recent remote change to a file wins.
#[instrument(skip(remote, commits), fields(repo = %remote.repo(), commits = commits.len()))]
pub async fn fetch_remote_changes(
    remote: &GitHubRemote,
    commits: &[String],
) -> Result<ChangeSet, GitHubError> {
    let mut tasks = JoinSet::new();
    for (idx, sha) in commits.iter().enumerate() {
        let remote = remote.clone();
        let sha = sha.clone();
        tasks.spawn(async move { (idx, fetch_commit_changes(&remote, &sha).await) });
    }

    let mut per_commit: Vec<Option<Result<Vec<FileChange>, GitHubError>>> =
        (0..commits.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (idx, result) = joined.map_err(|e| GitHubError::TaskFailed(e.to_string()))?;
        per_commit[idx] = Some(result);
    }

    let mut ordered = Vec::with_capacity(per_commit.len());
    for (idx, slot) in per_commit.into_iter().enumerate() {
        let files = slot.ok_or_else(|| {
            GitHubError::TaskFailed(format!("no result for commit {}", commits[idx]))
        })??;
        ordered.push(files);
    }

    let total: usize = ordered.iter().map(Vec::len).sum();
    let changes = ChangeSet::first_wins(ordered.into_iter().flatten());
    info!(files = total, unique = changes.len(), "collected remote changes");
    Ok(changes)
}

/// All files changed by one commit, following GitHub's per-commit file
/// pagination when the first response is full.
pub async fn fetch_commit_changes(
    remote: &GitHubRemote,
    sha: &str,
) -> Result<Vec<FileChange>, GitHubError> {
    let mut files = remote.commit_files(sha, None).await?;
    if files.len() < COMMIT_FILES_PAGE_SIZE {
        return Ok(files);
    }

    for page in 2..=MAX_COMMIT_FILE_PAGES {
        let batch = remote.commit_files(sha, Some(page)).await?;
        let batch_len = batch.len();
        files.extend(batch);
        if batch_len < COMMIT_FILES_PAGE_SIZE {
            break;
        }
    }

    debug!(sha, count = files.len(), "fetched paginated commit files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::github::mock::ScriptedApi;
    use crate::models::ChangeStatus;

    fn remote(api: &ScriptedApi) -> GitHubRemote {
        GitHubRemote::new(Arc::new(api.clone()), "o", "r")
    }

    fn files_body(files: &[(&str, &str)]) -> String {
        let items: Vec<String> = files
            .iter()
            .map(|(name, sha)| {
                format!(r#"{{"filename":"{}","status":"modified","sha":"{}"}}"#, name, sha)
            })
            .collect();
        format!(r#"{{"files":[{}]}}"#, items.join(","))
    }

    fn numbered(prefix: &str, n: usize) -> String {
        let names: Vec<String> = (0..n).map(|i| format!("{}{}", prefix, i)).collect();
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "x")).collect();
        files_body(&pairs)
    }

    #[tokio::test]
    async fn test_newest_change_wins_despite_completion_order() {
        // The newest commit answers last.
        let api = ScriptedApi::new()
            .on("/repos/o/r/commits/new", 200, files_body(&[("shared.rs", "v2"), ("a.rs", "a")]))
            .on("/repos/o/r/commits/old", 200, files_body(&[("shared.rs", "v1"), ("b.rs", "b")]))
            .delay("/repos/o/r/commits/new", Duration::from_millis(50));

        let commits = vec!["new".to_string(), "old".to_string()];
        let changes = fetch_remote_changes(&remote(&api), &commits).await.unwrap().into_vec();

        let names: Vec<&str> = changes.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(names, vec!["shared.rs", "a.rs", "b.rs"]);
        assert_eq!(changes[0].sha.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_requests_are_concurrent() {
        let api = ScriptedApi::new()
            .on("/repos/o/r/commits/c1", 200, files_body(&[("a", "1")]))
            .on("/repos/o/r/commits/c2", 200, files_body(&[("b", "2")]))
            .on("/repos/o/r/commits/c3", 200, files_body(&[("c", "3")]))
            .delay("/repos/o/r/commits/c1", Duration::from_millis(200))
            .delay("/repos/o/r/commits/c2", Duration::from_millis(200))
            .delay("/repos/o/r/commits/c3", Duration::from_millis(200));

        let commits: Vec<String> = ["c1", "c2", "c3"].iter().map(|s| s.to_string()).collect();
        let started = std::time::Instant::now();
        let changes = fetch_remote_changes(&remote(&api), &commits).await.unwrap();
        assert_eq!(changes.len(), 3);
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_no_commits() {
        let api = ScriptedApi::new();
        let changes = fetch_remote_changes(&remote(&api), &[]).await.unwrap();
        assert!(changes.is_empty());
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_any_commit_failure_fails_fetch() {
        let api = ScriptedApi::new()
            .on("/repos/o/r/commits/c1", 200, files_body(&[("a", "1")]))
            .on("/repos/o/r/commits/c2", 500, "boom");
        let commits = vec!["c1".to_string(), "c2".to_string()];
        let err = fetch_remote_changes(&remote(&api), &commits).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_large_commit_follows_pages() {
        let api = ScriptedApi::new()
            .on("/repos/o/r/commits/big", 200, numbered("p1-", 300))
            .on("/repos/o/r/commits/big?page=2&per_page=300", 200, numbered("p2-", 300))
            .on("/repos/o/r/commits/big?page=3&per_page=300", 200, numbered("p3-", 12))
            .on("/repos/o/r/commits/big?page=4&per_page=300", 200, numbered("p4-", 1));

        let files = fetch_commit_changes(&remote(&api), "big").await.unwrap();
        assert_eq!(files.len(), 612);
        assert_eq!(files[611].filename, "p3-11");
        assert_eq!(files[0].status, ChangeStatus::Modified);
        assert_eq!(api.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_large_commit_page_cap() {
        let mut api = ScriptedApi::new().on("/repos/o/r/commits/huge", 200, numbered("p1-", 300));
        for page in 2..=11 {
            api = api.on(
                &format!("/repos/o/r/commits/huge?page={}&per_page=300", page),
                200,
                numbered(&format!("p{}-", page), 300),
            );
        }

        let files = fetch_commit_changes(&remote(&api), "huge").await.unwrap();
        assert_eq!(files.len(), 3000);
        assert_eq!(api.requests().len(), MAX_COMMIT_FILE_PAGES as usize);
    }

    #[tokio::test]
    async fn test_small_commit_is_single_request() {
        let api = ScriptedApi::new().on("/repos/o/r/commits/c1", 200, numbered("f", 299));
        let files = fetch_commit_changes(&remote(&api), "c1").await.unwrap();
        assert_eq!(files.len(), 299);
        assert_eq!(api.requests(), vec!["/repos/o/r/commits/c1"]);
    }
}
