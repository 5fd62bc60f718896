// src/error.rs
// =============================================================================
// Error types for the library.
//
// Every failure the uploader can hit is one variant of `Error`, so callers
// can `match` on the kind instead of reading message text:
// - Access: the repository check failed, nothing was written yet
// - Upload: one file's PUT was rejected, other files may already be committed
// - Unexpected: network faults, unreadable files, client setup problems
// - InvalidRequest: bad input caught before any request is made
// - Cancelled: the caller's cancellation token fired
//
// The Display text of each variant is the human readable message the CLI
// prints.
// =============================================================================

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Why the repository access check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// HTTP 404: the repository is missing or its name is wrong.
    #[error(
        "Repository \"{repository}\" not found. Please check if the repository exists and the name is correct."
    )]
    NotFound { repository: String },

    /// HTTP 401
    #[error("Invalid token. Please check if your token is correct and not expired.")]
    InvalidToken,

    /// HTTP 403
    #[error("Insufficient permissions. Make sure your token has the \"repo\" scope.")]
    InsufficientScope,

    /// Any other non-success status.
    #[error("Failed to verify repository access. Please check repository name and token.")]
    Failed { status: u16 },
}

impl AccessError {
    /// Maps a non-success status from the repository check to its error.
    pub fn from_status(status: u16, repository: &str) -> Self {
        match status {
            404 => AccessError::NotFound {
                repository: repository.to_string(),
            },
            401 => AccessError::InvalidToken,
            403 => AccessError::InsufficientScope,
            other => AccessError::Failed { status: other },
        }
    }
}

/// Main error type returned by [`crate::Uploader`].
///
/// An `Upload` or `Unexpected` error raised during the upload phase does not
/// mean nothing was written: files whose uploads finished before or alongside
/// the failing one stay committed in the repository.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The Contents API rejected a file. `message` is the API's own message
    /// when it sent one.
    #[error("{message}")]
    Upload { file: String, message: String },

    #[error("{message}")]
    Unexpected { message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// `uploads_started` is false when cancellation hit during the access
    /// check, so nothing can have been written.
    #[error("Upload cancelled")]
    Cancelled { uploads_started: bool },
}

impl Error {
    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        Error::Unexpected {
            message: message.into(),
        }
    }

    /// True for failures raised before anything was written to the repository.
    pub fn is_before_write(&self) -> bool {
        matches!(
            self,
            Error::Access(_)
                | Error::InvalidRequest(_)
                | Error::Cancelled {
                    uploads_started: false
                }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::unexpected(err.to_string())
    }
}
