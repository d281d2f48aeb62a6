// crates/review-gate-core/src/validation/download.rs
// ============================================================================
// Module: Download Spooling
// Description: Bounded streaming download to a scoped temporary file.
// Purpose: Hash and count a remote payload without buffering it in memory.
// Dependencies: md-5, hex, tempfile
// ============================================================================

//! ## Overview
//! [`spool_download`] copies a reader into a temporary file while computing
//! an MD5 digest and byte count in the same pass. Reading stops as soon as
//! more than `limit` bytes have arrived. The temporary file is deleted when
//! the returned [`SpooledDownload`] is dropped, on every exit path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;

use md5::Digest;
use md5::Md5;
use tempfile::NamedTempFile;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Copy buffer size.
const CHUNK_SIZE: usize = 64 * 1024;

// ============================================================================
// SECTION: Spooled Download
// ============================================================================

/// Downloaded payload held in a temporary file.
///
/// # Invariants
/// - When `exceeded` is true the file holds at most `limit + 1` bytes and the
///   digest covers only that prefix.
pub struct SpooledDownload {
    /// Temporary file, removed on drop.
    file: NamedTempFile,
    /// Lowercase hex MD5 of the bytes written.
    md5_hex: String,
    /// Number of bytes written.
    byte_count: u64,
    /// Whether the source produced more than the limit.
    exceeded: bool,
}

impl SpooledDownload {
    /// Returns the temporary file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Returns the lowercase hex MD5 digest.
    #[must_use]
    pub fn md5_hex(&self) -> &str {
        &self.md5_hex
    }

    /// Returns the number of bytes received.
    #[must_use]
    pub const fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Returns true when the source exceeded the size limit.
    #[must_use]
    pub const fn exceeded(&self) -> bool {
        self.exceeded
    }
}

/// Streams `reader` into a temporary file under `dir` (or the system temp
/// directory), hashing as it writes and stopping once `limit` is exceeded.
///
/// # Errors
///
/// Returns [`io::Error`] when the temporary file cannot be created or
/// written, or when reading the source fails.
pub fn spool_download<R: Read>(
    reader: R,
    limit: u64,
    dir: Option<&Path>,
) -> io::Result<SpooledDownload> {
    let mut file = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };
    let mut limited = reader.take(limit.saturating_add(1));
    let mut hasher = Md5::new();
    let mut byte_count: u64 = 0;
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    loop {
        let read = match limited.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        let chunk = &buffer[.. read];
        hasher.update(chunk);
        file.write_all(chunk)?;
        byte_count = byte_count.saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
    }
    file.flush()?;
    file.as_file_mut().seek(SeekFrom::Start(0))?;
    Ok(SpooledDownload {
        file,
        md5_hex: hex::encode(hasher.finalize()),
        byte_count,
        exceeded: byte_count > limit,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use std::io::Cursor;

    use super::spool_download;

    #[test]
    fn spool_hashes_and_counts() {
        let download = spool_download(Cursor::new(b"hello".to_vec()), 16, None).unwrap();
        assert_eq!(download.byte_count(), 5);
        assert_eq!(download.md5_hex(), "5d41402abc4b2a76b9719d911017c592");
        assert!(!download.exceeded());
        assert_eq!(std::fs::read(download.path()).unwrap(), b"hello");
    }

    #[test]
    fn spool_stops_after_limit() {
        let source = Cursor::new(vec![7_u8; 1000]);
        let download = spool_download(source, 10, None).unwrap();
        assert!(download.exceeded());
        assert_eq!(download.byte_count(), 11);
    }

    #[test]
    fn spool_file_removed_on_drop() {
        let download = spool_download(Cursor::new(b"x".to_vec()), 4, None).unwrap();
        let path = download.path().to_path_buf();
        assert!(path.exists());
        drop(download);
        assert!(!path.exists());
    }
}
