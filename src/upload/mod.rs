// src/upload/mod.rs
// =============================================================================
// Uploading files to a repository.
//
// Submodules:
// - source: the files to upload (on disk or in memory)
// - encode: base64 encoding of file content
// - batch: access check plus the concurrent per-file uploads
// =============================================================================

mod batch;
mod encode;
mod source;

pub use batch::{upload_files, UploadRequest, UploadedFile, Uploader};
pub use encode::{encode_content, CHUNK_SIZE};
pub use source::{FileSource, UploadFile};
