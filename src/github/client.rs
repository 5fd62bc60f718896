// src/github/client.rs
// =============================================================================
// Thin client for the two GitHub REST calls we need:
// - GET  /repos/{owner}/{repo}                   (does it exist, can we see it?)
// - PUT  /repos/{owner}/{repo}/contents/{path}   (commit one file)
//
// Both carry the token as a bearer credential and ask for the v3 JSON media
// type. Where the requests are sent is decided by `ApiEndpoint`, so the same
// code talks to GitHub directly, through a forwarding proxy, or to a mock
// server in tests.
// =============================================================================

use crate::config::{ApiEndpoint, UploaderConfig};
use crate::error::{AccessError, Error, Result};
use crate::github::RepoId;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Media type for the GitHub REST API v3.
pub const GITHUB_V3_JSON: &str = "application/vnd.github.v3+json";

// JSON body of a Contents API PUT
#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: &'a str,
}

/// Authenticated GitHub API client for one token.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    endpoint: ApiEndpoint,
    token: String,
}

impl GithubClient {
    /// Builds a client from the shared HTTP client and a token.
    pub fn new(http: Client, endpoint: ApiEndpoint, token: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            token: token.into(),
        }
    }

    /// Creates the reqwest client every GitHub call goes through.
    ///
    /// Client is cheap to clone (connection pool behind an Arc), so one is
    /// built per `Uploader` and shared by all uploads.
    pub fn build_http(config: &UploaderConfig) -> Result<Client> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        builder
            .build()
            .map_err(|e| Error::unexpected(format!("Failed to create HTTP client: {}", e)))
    }

    /// Checks that the repository exists and the token can see it.
    ///
    /// Maps 404/401/403 and other non-success codes to an [`AccessError`].
    pub async fn verify_access(&self, repo: &RepoId) -> Result<()> {
        let url = self.endpoint.url_for(&repo.api_path());
        debug!(%repo, %url, "verifying repository access");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_V3_JSON)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%repo, status = status.as_u16(), "repository access check failed");
            return Err(AccessError::from_status(status.as_u16(), &repo.to_string()).into());
        }

        Ok(())
    }

    /// Commits one file at the repository root with message "Upload {name}".
    ///
    /// `content` must already be base64 encoded. Returns the API's JSON
    /// response body as-is.
    pub async fn put_file(&self, repo: &RepoId, name: &str, content: &str) -> Result<Value> {
        let url = self.endpoint.url_for(&repo.contents_path(name));
        debug!(%repo, file = name, %url, encoded_len = content.len(), "uploading file");

        let body = PutContents {
            message: format!("Upload {}", name),
            content,
        };

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_V3_JSON)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| format!("Failed to upload {}", name));
            return Err(Error::Upload {
                file: name.to_string(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

// Pulls the `message` field out of a GitHub error body, if there is one
async fn error_message(response: Response) -> Option<String> {
    let body: Value = response.json().await.ok()?;
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `.await?` do on `send()`?
//    - `.await` waits for the response without blocking the thread
//    - `?` turns a reqwest::Error into our Error through the From impl in
//      error.rs, then returns early
//
// 2. Why `Option<String>` from error_message?
//    - GitHub error bodies usually carry a "message" field, but a proxy or
//      load balancer may answer with HTML instead
//    - `.ok()?` inside a function returning Option bails out with None,
//      and the caller falls back to its own message
//
// 3. Why a struct with `&'a str` for the PUT body?
//    - The base64 content can be megabytes long
//    - Borrowing it avoids copying it just to serialize it
// -----------------------------------------------------------------------------
