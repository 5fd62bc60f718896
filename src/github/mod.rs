// src/github/mod.rs
// =============================================================================
// Everything that talks to GitHub:
// - repo: parsing "owner/repo" identifiers (or github.com URLs)
// - client: the repository access check and the Contents API upload call
// =============================================================================

mod client;
mod repo;

pub use client::{GithubClient, GITHUB_V3_JSON};
pub use repo::RepoId;
