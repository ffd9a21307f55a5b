//! Scripted [`RemoteApi`] for deterministic testing.
//!
//! Requests are keyed by path plus query string in the order the caller
//! passed the parameters, e.g. `/repos/o/r/commits?sha=abc&per_page=100&page=1`.
//! Unknown requests answer `404`. A per-request delay lets tests make
//! concurrent fetches complete out of order.
//!
//! ```
//! use gitconflict_core::github::mock::ScriptedApi;
//! use gitconflict_core::github::RemoteApi;
//!
//! # tokio_test::block_on(async {
//! let api = ScriptedApi::new().on("/repos/o/r/branches/main", 200, r#"{"commit":{"sha":"abc"}}"#);
//! let resp = api.get("/repos/o/r/branches/main", &[]).await.unwrap();
//! assert_eq!(resp.status, 200);
//! assert_eq!(api.requests(), vec!["/repos/o/r/branches/main"]);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::api::{ApiResponse, RemoteApi};
use crate::errors::GitHubError;

/// Replays canned responses and records every request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedApi {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    responses: HashMap<String, ApiResponse>,
    delays: HashMap<String, Duration>,
    requests: Vec<String>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `key` with `status` and `body`. Later calls replace earlier ones.
    pub fn on(self, key: &str, status: u16, body: impl Into<String>) -> Self {
        self.lock()
            .responses
            .insert(key.to_string(), ApiResponse::new(status, body));
        self
    }

    /// Hold the response to `key` for `delay` before answering.
    pub fn delay(self, key: &str, delay: Duration) -> Self {
        self.lock().delays.insert(key.to_string(), delay);
        self
    }

    /// Keys of every request so far, in the order they were received.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Build the lookup key for a request.
    pub fn key(path: &str, query: &[(&str, String)]) -> String {
        if query.is_empty() {
            return path.to_string();
        }
        let qs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}?{}", path, qs.join("&"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RemoteApi for ScriptedApi {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, GitHubError> {
        let key = Self::key(path, query);
        let (response, delay) = {
            let mut inner = self.lock();
            inner.requests.push(key.clone());
            (
                inner.responses.get(&key).cloned(),
                inner.delays.get(&key).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(response.unwrap_or_else(|| ApiResponse::new(404, r#"{"message":"Not Found"}"#)))
    }
}
