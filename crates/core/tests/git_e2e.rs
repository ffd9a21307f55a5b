//! End-to-end detection against a real local git repository.
//!
//! The local side runs the real `git` binary in a temporary repository. The
//! remote side is scripted, fed with blob SHAs computed from the same
//! repository so that convergent changes hash identically.
//!
//! Tests skip gracefully if `git` is not installed.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;

use gitconflict_core::git::{LocalRepo, SystemCommandRunner};
use gitconflict_core::github::mock::ScriptedApi;
use gitconflict_core::{ChangeStatus, ConflictDetector, DetectorConfig};

// ===========================================================================
// Helpers
// ===========================================================================

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

struct Fixture {
    dir: TempDir,
    base: String,
    remote_head: String,
}

/// Repository with:
/// - `main` at base: a.txt, b.txt, c.txt
/// - `origin/main` one commit ahead: a.txt and b.txt changed, c.txt changed
/// - `topic` one commit ahead of base: a.txt changed differently, b.txt
///   changed identically, c.txt deleted, d.txt added
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    git(path, &["init", "-q"]);
    git(path, &["checkout", "-q", "-b", "main"]);

    write(path, "a.txt", "a\n");
    write(path, "b.txt", "b\n");
    write(path, "c.txt", "c\n");
    let base = commit_all(path, "base");

    git(path, &["checkout", "-q", "-b", "upstream"]);
    write(path, "a.txt", "remote a\n");
    write(path, "b.txt", "same b\n");
    write(path, "c.txt", "remote c\n");
    let remote_head = commit_all(path, "remote work");
    git(path, &["update-ref", "refs/remotes/origin/main", &remote_head]);

    git(path, &["checkout", "-q", "main"]);
    git(path, &["checkout", "-q", "-b", "topic"]);
    write(path, "a.txt", "local a\n");
    write(path, "b.txt", "same b\n");
    std::fs::remove_file(path.join("c.txt")).unwrap();
    write(path, "d.txt", "new\n");
    commit_all(path, "local work");

    Fixture {
        dir,
        base,
        remote_head,
    }
}

fn blob(dir: &Path, rev: &str, file: &str) -> String {
    git(dir, &["rev-parse", &format!("{}:{}", rev, file)])
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn local_repo_against_real_git() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let fx = fixture();
    let runner = SystemCommandRunner::new();
    let repo = LocalRepo::new(&runner, fx.dir.path());

    repo.validate("topic").unwrap();
    assert!(repo.validate("no-such-branch").is_err());

    let base = repo.merge_base("origin/main", "topic").unwrap();
    assert_eq!(base, fx.base);

    let changes = repo.local_changes(&base, "topic").unwrap().into_vec();
    let find = |name: &str| changes.iter().find(|c| c.filename == name).unwrap();
    assert_eq!(changes.len(), 4);
    assert_eq!(find("a.txt").status, ChangeStatus::Modified);
    assert_eq!(
        find("a.txt").sha.as_deref(),
        Some(blob(fx.dir.path(), "topic", "a.txt").as_str())
    );
    assert_eq!(find("c.txt").status, ChangeStatus::Removed);
    assert_eq!(find("c.txt").sha, None);
    assert_eq!(find("d.txt").status, ChangeStatus::Modified);
}

#[test]
fn validate_rejects_plain_directory() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let runner = SystemCommandRunner::new();
    let err = LocalRepo::new(&runner, dir.path())
        .validate("main")
        .unwrap_err();
    assert!(err.to_string().contains("Invalid git repository"));
}

#[test]
fn branch_checked_out_in_linked_worktree_is_found() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let fx = fixture();
    let path = fx.dir.path();
    git(path, &["checkout", "-q", "main"]);
    let linked = TempDir::new().unwrap();
    let linked_path = linked.path().join("topic-wt");
    git(
        path,
        &["worktree", "add", "-q", &linked_path.display().to_string(), "topic"],
    );

    let runner = SystemCommandRunner::new();
    LocalRepo::new(&runner, path).validate("topic").unwrap();
}

#[tokio::test]
async fn non_ascii_and_padded_paths_match_remote_names() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    git(path, &["init", "-q"]);
    git(path, &["checkout", "-q", "-b", "main"]);
    write(path, "h\u{e9}llo.txt", "hello\n");
    write(path, "pad ", "pad\n");
    let base = commit_all(path, "base");
    git(path, &["update-ref", "refs/remotes/origin/main", &base]);

    git(path, &["checkout", "-q", "-b", "topic"]);
    write(path, "h\u{e9}llo.txt", "local\n");
    write(path, "pad ", "local pad\n");
    commit_all(path, "local work");

    let runner = SystemCommandRunner::new();
    let repo = LocalRepo::new(&runner, path);
    let changes = repo.local_changes(&base, "topic").unwrap().into_vec();
    let mut names: Vec<&str> = changes.iter().map(|c| c.filename.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["h\u{e9}llo.txt", "pad "]);
    assert!(changes
        .iter()
        .all(|c| c.status == ChangeStatus::Modified && c.sha.is_some()));

    let head = "remotehead";
    let api = ScriptedApi::new()
        .on(
            "/repos/acme/widgets/branches/main",
            200,
            format!(r#"{{"commit":{{"sha":"{}"}}}}"#, head),
        )
        .on(
            &format!("/repos/acme/widgets/commits?sha={}&per_page=100&page=1", head),
            200,
            format!(r#"[{{"sha":"{}"}},{{"sha":"{}"}}]"#, head, base),
        )
        .on(
            &format!("/repos/acme/widgets/commits/{}", head),
            200,
            r#"{"files":[{"filename":"h\u00e9llo.txt","status":"modified","sha":"remote-sha"}]}"#,
        );
    let config = DetectorConfig::new(
        "acme",
        "widgets",
        "token",
        path.display().to_string(),
        "main",
        "topic",
    );
    let report = ConflictDetector::with_collaborators(
        config,
        Arc::new(SystemCommandRunner::new()),
        Arc::new(api),
    )
    .detect()
    .await;

    assert!(report.error.is_none(), "unexpected error: {:?}", report.error);
    assert_eq!(report.potential_conflicts, vec!["h\u{e9}llo.txt"]);
}

#[tokio::test]
async fn detect_end_to_end() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let fx = fixture();
    let path = fx.dir.path();
    let head = &fx.remote_head;

    let files = format!(
        r#"{{"sha":"{head}","files":[
            {{"filename":"a.txt","status":"modified","sha":"{a}"}},
            {{"filename":"b.txt","status":"modified","sha":"{b}"}},
            {{"filename":"c.txt","status":"modified","sha":"{c}"}}
        ]}}"#,
        head = head,
        a = blob(path, head, "a.txt"),
        b = blob(path, head, "b.txt"),
        c = blob(path, head, "c.txt"),
    );
    let api = ScriptedApi::new()
        .on(
            "/repos/acme/widgets/branches/main",
            200,
            format!(r#"{{"commit":{{"sha":"{}"}}}}"#, head),
        )
        .on(
            &format!("/repos/acme/widgets/commits?sha={}&per_page=100&page=1", head),
            200,
            format!(r#"[{{"sha":"{}"}},{{"sha":"{}"}}]"#, head, fx.base),
        )
        .on(&format!("/repos/acme/widgets/commits/{}", head), 200, files);

    let config = DetectorConfig::new(
        "acme",
        "widgets",
        "token",
        path.display().to_string(),
        "main",
        "topic",
    );
    let report = ConflictDetector::with_collaborators(
        config,
        Arc::new(SystemCommandRunner::new()),
        Arc::new(api),
    )
    .detect()
    .await;

    assert!(report.error.is_none(), "unexpected error: {:?}", report.error);
    assert_eq!(report.merge_base_commit, fx.base);
    // b.txt converged on identical content; c.txt was deleted locally.
    assert_eq!(report.potential_conflicts, vec!["a.txt", "c.txt"]);
}
