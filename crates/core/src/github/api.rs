//! Transport port for the GitHub REST API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::{debug, info};

use crate::errors::GitHubError;

/// Raw HTTP response: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends authenticated GET requests against the API.
///
/// Implementations return `Ok` for any HTTP status; interpreting the status
/// is the caller's job. `Err` is reserved for transport failures.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, GitHubError>;
}

/// [`RemoteApi`] over `reqwest` with bearer-token auth.
#[derive(Clone)]
pub struct HttpRemoteApi {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl HttpRemoteApi {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let token = token.into();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitconflict/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        info!(api_url = %api_url, "created HttpRemoteApi");
        Ok(Self {
            http,
            api_url,
            token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl std::fmt::Debug for HttpRemoteApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteApi")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        let mut req = self.http.get(&url).bearer_auth(&self.token);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(url = %url, status, bytes = body.len(), "GET");
        Ok(ApiResponse { status, body })
    }
}
