// src/upload/source.rs
// =============================================================================
// Files to upload.
//
// Each file has a name (the path it will get in the repository, used exactly
// as given, no folders) and somewhere to read its bytes from: a file on disk
// or a buffer already in memory.
// =============================================================================

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Where a file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One file to commit.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Remote path, relative to the repository root.
    pub name: String,
    pub source: FileSource,
}

impl UploadFile {
    /// A local file uploaded under its own file name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidRequest(format!("Path has no usable file name: {}", path.display()))
            })?
            .to_string();

        Ok(Self {
            name,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// A local file uploaded under a different remote name.
    pub fn with_name(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Path(path.into()),
        }
    }

    /// In-memory content.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Bytes(bytes.into()),
        }
    }

    /// Reads the whole content into memory.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                Error::unexpected(format!("Failed to read {}: {}", path.display(), e))
            }),
        }
    }
}
