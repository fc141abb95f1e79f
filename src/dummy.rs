//! Dummy payload construction.
//!
//! The payload is written sparsely: the stream is positioned at `size` and a
//! single random byte is written there, giving a logical length of
//! `size + 1`. Whatever the storage does with the gap, the same stream is
//! hashed and uploaded, so the digest stays self-consistent.

use std::io::{self, Seek, SeekFrom, Write};

use rand::RngCore;

/// Writes the dummy payload for `size` into `stream` and returns its logical
/// length, which is always `size + 1`.
///
/// # Errors
///
/// Returns the underlying I/O error when seeking or writing fails.
pub fn write_dummy_payload<W, R>(stream: &mut W, size: u64, rng: &mut R) -> io::Result<u64>
where
    W: Write + Seek,
    R: RngCore + ?Sized,
{
    stream.seek(SeekFrom::Start(size))?;
    let mut tail = [0_u8; 1];
    rng.fill_bytes(&mut tail);
    stream.write_all(&tail)?;
    stream.flush()?;
    stream.stream_position()
}
