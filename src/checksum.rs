//! SHA-256 digests over seekable local streams.

use std::io::{self, Read, Seek};

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Rewinds `stream` and returns the lowercase hex SHA-256 of its entire
/// contents. The cursor is left at the end of the stream.
///
/// # Errors
///
/// Returns the underlying I/O error when seeking or reading fails.
pub fn sha256_hex<S: Read + Seek>(stream: &mut S) -> io::Result<String> {
    stream.rewind()?;
    let mut hasher = Sha256::new();
    io::copy(stream, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
