// src/github/repo.rs
// =============================================================================
// Repository identifiers.
//
// Users usually type "owner/repo", but copying the URL out of the browser is
// just as common, so both are accepted:
//   - owner/repo
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - github.com/owner/repo
//
// Whatever the input, the identifier is shown and sent as "owner/repo".
// =============================================================================

use crate::error::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::str::FromStr;

// Everything except RFC 3986 unreserved characters, so a file name always
// stays one path segment (`#`, `?`, `/`, `&` and `%` included)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A GitHub repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parses an `owner/name` identifier or a github.com URL.
    ///
    /// Example:
    ///   "https://github.com/rust-lang/rust" -> rust-lang/rust
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::InvalidRequest(
                "Repository identifier must not be empty".to_string(),
            ));
        }

        // Remove common prefixes
        let stripped = input
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.");

        let (path, from_url) = match stripped.strip_prefix("github.com/") {
            Some(path) => (path.trim_end_matches('/'), true),
            None if stripped.len() != input.len() => {
                return Err(Error::InvalidRequest(format!("Not a GitHub URL: {}", input)));
            }
            None => (stripped, false),
        };

        let parts: Vec<&str> = path.split('/').collect();

        // URLs may carry extra segments (/tree/main, ...), bare ids may not
        let valid = if from_url {
            parts.len() >= 2
        } else {
            parts.len() == 2
        };

        if !valid || parts[0].is_empty() || parts[1].is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Repository must look like owner/repo: {}",
                input
            )));
        }

        let owner = parts[0].to_string();
        let name = parts[1].trim_end_matches(".git").to_string();

        if name.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Repository must look like owner/repo: {}",
                input
            )));
        }

        Ok(RepoId { owner, name })
    }

    /// Path of the repository resource: `/repos/{owner}/{name}`
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.name)
    }

    /// Path of a file in the repository root: `/repos/{owner}/{name}/contents/{file}`
    ///
    /// The file name is percent-encoded as a single segment, so the remote
    /// path is exactly the name given.
    pub fn contents_path(&self, file_name: &str) -> String {
        format!(
            "{}/contents/{}",
            self.api_path(),
            utf8_percent_encode(file_name, PATH_SEGMENT)
        )
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RepoId::parse(s)
    }
}
