// src/config.rs
// =============================================================================
// Configuration for the uploader.
//
// The only outside collaborator is "how do we reach the GitHub API":
// - Direct: talk to https://api.github.com (or a mock server in tests)
// - Proxied: go through a forwarding proxy that takes the upstream URL in a
//   `?url=` query parameter
//
// Everything else (token, repository, files) comes with each request.
//
// Rust concepts:
// - Enums with data: each variant carries the URLs it needs
// - Builder methods taking `mut self`: chain `.with_x()` calls on a value
// - `const` AsciiSet: the escaping rules are built at compile time
// =============================================================================

use crate::error::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::time::Duration;
use url::Url;

/// Public GitHub REST API root.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Default number of uploads allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Characters that would end or split the `url=` value. `%` is included so
// escapes already in the path survive the proxy decoding the query once.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

/// How requests reach the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEndpoint {
    /// Requests go straight to `api_base`.
    Direct { api_base: String },
    /// Requests go to `proxy_base?url=<upstream url>`.
    Proxied { proxy_base: String, api_base: String },
}

impl ApiEndpoint {
    /// Direct access to `api_base`, validated as an http(s) URL.
    pub fn direct(api_base: &str) -> Result<Self> {
        Ok(ApiEndpoint::Direct {
            api_base: validate_base(api_base)?,
        })
    }

    /// Forwarding proxy in front of `api_base`.
    pub fn proxied(proxy_base: &str, api_base: &str) -> Result<Self> {
        Ok(ApiEndpoint::Proxied {
            proxy_base: validate_base(proxy_base)?,
            api_base: validate_base(api_base)?,
        })
    }

    /// Turns an upstream API path (e.g. `/repos/octo/repo`) into the URL we
    /// actually send the request to.
    pub fn url_for(&self, api_path: &str) -> String {
        match self {
            ApiEndpoint::Direct { api_base } => format!("{}{}", api_base, api_path),
            // The upstream URL goes after `url=` unencoded apart from the
            // characters that would break the query
            ApiEndpoint::Proxied {
                proxy_base,
                api_base,
            } => format!(
                "{}?url={}{}",
                proxy_base,
                api_base,
                utf8_percent_encode(api_path, QUERY_VALUE)
            ),
        }
    }
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        ApiEndpoint::Direct {
            api_base: GITHUB_API_BASE.to_string(),
        }
    }
}

// Checks the URL parses and is http(s), then drops any trailing slash so
// paths can be appended with a plain format!
fn validate_base(base: &str) -> Result<String> {
    let parsed = Url::parse(base)
        .map_err(|e| Error::InvalidRequest(format!("Invalid URL '{}': {}", base, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::InvalidRequest(format!(
            "URL must be http or https: {}",
            base
        )));
    }

    Ok(base.trim_end_matches('/').to_string())
}

/// Settings shared by every upload made with one [`crate::Uploader`].
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub endpoint: ApiEndpoint,
    /// Maximum uploads in flight. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Total time allowed per request, off by default. A PUT that times out
    /// may still have been committed by GitHub.
    pub timeout: Option<Duration>,
    /// Time allowed to establish a connection.
    pub connect_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            endpoint: ApiEndpoint::default(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            user_agent: concat!("repo-upload/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UploaderConfig {
    pub fn with_endpoint(mut self, endpoint: ApiEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
