//! Content-fetch collaborator: repository file retrieval.
//!
//! The seam is the `ContentFetcher` trait; the production implementation
//! talks to the GitHub contents API. Absence is an outcome, not an error,
//! so the pipeline can map it to a user-visible 404 without string matching.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::GithubSettings;

/// What a fetch produced: the raw file bytes, or a definitive "not there".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(Vec<u8>),
    NotFound,
}

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("contents request failed: {0}")]
    Transport(String),
    #[error("contents endpoint returned status {0}")]
    Status(u16),
    #[error("contents payload invalid: {0}")]
    Payload(String),
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the file at `path` in `owner_repo` pinned to `git_ref`.
    async fn fetch_file(
        &self,
        owner_repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<FetchOutcome, FetchError>;
}

/// Contents-API response body; only the payload field matters here.
#[derive(Debug, Deserialize)]
struct ContentsPayload {
    content: String,
}

/// Production fetcher backed by the GitHub contents API.
pub struct GithubContentFetcher {
    client: reqwest::Client,
    api_base_url: Url,
    token: Option<String>,
}

impl GithubContentFetcher {
    pub fn new(settings: &GithubSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            api_base_url: settings.api_base_url.clone(),
            token: settings.token.clone(),
        })
    }

    fn contents_url(
        &self,
        owner_repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<Url, FetchError> {
        let mut url = self.api_base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FetchError::Payload("GitHub API base URL cannot take path segments".to_string())
            })?;
            segments.pop_if_empty();
            segments.push("repos");
            for part in owner_repo.split('/') {
                segments.push(part);
            }
            segments.push("contents");
            for part in path.split('/') {
                segments.push(part);
            }
        }
        url.query_pairs_mut().append_pair("ref", git_ref);
        Ok(url)
    }
}

#[async_trait]
impl ContentFetcher for GithubContentFetcher {
    async fn fetch_file(
        &self,
        owner_repo: &str,
        git_ref: &str,
        path: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let url = self.contents_url(owner_repo, git_ref, path)?;
        debug!(owner_repo, git_ref, path, "Fetching document contents");

        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("chiaro/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(FetchOutcome::NotFound),
            status if status.is_success() => {
                let payload: ContentsPayload = response
                    .json()
                    .await
                    .map_err(|err| FetchError::Payload(err.to_string()))?;

                // The contents API wraps base64 at 60 columns; strip the
                // embedded newlines before decoding.
                let encoded: String = payload
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                let bytes = BASE64
                    .decode(encoded)
                    .map_err(|err| FetchError::Payload(err.to_string()))?;

                Ok(FetchOutcome::Found(bytes))
            }
            status => Err(FetchError::Status(status.as_u16())),
        }
    }
}
