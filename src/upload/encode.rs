// src/upload/encode.rs
// =============================================================================
// Base64 encoding of file content for the Contents API.
//
// Content is fed to a streaming encoder in fixed size chunks. The encoder
// carries leftover bytes between writes, so chunk sizes that are not a
// multiple of 3 still produce exactly the same text as a one-shot encode.
// =============================================================================

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderStringWriter;
use std::io::Write;

/// Bytes handed to the encoder per write.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Encodes `bytes` as standard, padded base64.
pub fn encode_content(bytes: &[u8]) -> String {
    let mut encoder = EncoderStringWriter::new(&STANDARD);
    for chunk in bytes.chunks(CHUNK_SIZE) {
        encoder
            .write_all(chunk)
            .expect("writing into a String cannot fail");
    }
    encoder.into_inner()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not chunk and encode each piece separately?
//    - Base64 turns every 3 input bytes into 4 characters
//    - 32768 is not a multiple of 3, so encoding chunks on their own would
//      put padding ('=') in the middle of the output
//    - The streaming encoder keeps the 1-2 leftover bytes for the next write
//
// 2. What is `.chunks(n)`?
//    - A slice method yielding sub-slices of at most n elements
//    - The last chunk is shorter when the length isn't a multiple of n
// -----------------------------------------------------------------------------
