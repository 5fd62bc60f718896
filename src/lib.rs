// src/lib.rs
// =============================================================================
// repo-upload: commit local files to a GitHub repository through the
// Contents API.
//
// One call does two things, in order:
// 1. Check the repository exists and the token may access it
// 2. Upload every file concurrently, one commit per file
//
// Uploads are not atomic. If one file fails the call fails, but files that
// were already committed stay in the repository.
// =============================================================================

pub mod config;
pub mod error;
pub mod github;
pub mod upload;

pub use config::{ApiEndpoint, UploaderConfig};
pub use error::{AccessError, Error, Result};
pub use github::RepoId;
pub use upload::{upload_files, UploadFile, UploadRequest, UploadedFile, Uploader};

// Re-exported so callers don't need tokio-util just to cancel an upload
pub use tokio_util::sync::CancellationToken;
