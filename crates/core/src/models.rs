//! Data models shared across the detection pipeline.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// File changes
// ---------------------------------------------------------------------------

/// How a file changed relative to the merge base.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
    Unknown,
}

impl ChangeStatus {
    /// Map a GitHub `files[].status` value. Anything GitHub reports that is
    /// not a plain add, modify or remove becomes [`ChangeStatus::Unknown`].
    pub fn from_github(status: &str) -> Self {
        match status {
            "added" => Self::Added,
            "modified" => Self::Modified,
            "removed" => Self::Removed,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Removed => write!(f, "removed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One file touched on one side since the merge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub status: ChangeStatus,
    /// Blob SHA of the new content. `None` when unknown or deleted.
    pub sha: Option<String>,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, status: ChangeStatus, sha: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            status,
            sha,
        }
    }
}

// ---------------------------------------------------------------------------
// Change sets
// ---------------------------------------------------------------------------

/// Ordered collection of changes on one side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FileChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set keeping only the first change seen for each filename.
    pub fn first_wins<I>(changes: I) -> Self
    where
        I: IntoIterator<Item = FileChange>,
    {
        let mut seen = HashSet::new();
        let changes = changes
            .into_iter()
            .filter(|c| seen.insert(c.filename.clone()))
            .collect();
        Self { changes }
    }

    pub fn push(&mut self, change: FileChange) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileChange> {
        self.changes.iter()
    }

    /// Filename to content hash. Later duplicates overwrite earlier ones.
    pub fn sha_lookup(&self) -> HashMap<&str, Option<&str>> {
        self.changes
            .iter()
            .map(|c| (c.filename.as_str(), c.sha.as_deref()))
            .collect()
    }

    pub fn into_vec(self) -> Vec<FileChange> {
        self.changes
    }
}

impl From<Vec<FileChange>> for ChangeSet {
    fn from(changes: Vec<FileChange>) -> Self {
        Self { changes }
    }
}

impl FromIterator<FileChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = FileChange>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FileChange;
    type IntoIter = std::slice::Iter<'a, FileChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of one detection run.
///
/// Either a success (merge base plus possibly-empty conflict list) or an
/// error message with both other fields empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub merge_base_commit: String,
    pub potential_conflicts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConflictReport {
    pub fn success(merge_base_commit: impl Into<String>, potential_conflicts: Vec<String>) -> Self {
        Self {
            merge_base_commit: merge_base_commit.into(),
            potential_conflicts,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            merge_base_commit: String::new(),
            potential_conflicts: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn is_success(&self) -> bool {
        !self.has_error()
    }
}
