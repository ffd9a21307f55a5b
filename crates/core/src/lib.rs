//! gitconflict core library.
//!
//! Finds files that a local branch and a GitHub branch have both changed
//! since their merge base, without fetching the remote branch. Local changes
//! come from `git` in the working copy; remote changes come from walking the
//! branch history through the GitHub REST API. Files whose final blob SHA is
//! identical on both sides are not reported.

pub mod config;
pub mod conflict;
pub mod detector;
pub mod errors;
pub mod git;
pub mod github;
pub mod models;

// Re-exports for convenience.
pub use config::{ConfigFile, DetectorConfig};
pub use detector::{detect, ConflictDetector};
pub use models::{ChangeSet, ChangeStatus, ConflictReport, FileChange};
