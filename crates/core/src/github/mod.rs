//! Remote side of the comparison: the GitHub REST API.

pub mod api;
pub mod changes;
pub mod client;
pub mod history;
pub mod mock;

pub use api::{ApiResponse, HttpRemoteApi, RemoteApi};
pub use changes::fetch_remote_changes;
pub use client::GitHubRemote;
pub use history::walk_history;
