// crates/review-gate-core/src/validation/archive/tarball.rs
// ============================================================================
// Module: Tar Format
// Description: Tar detection (plain, gzip, bzip2, xz) and member listing.
// Purpose: Identify tar streams by header checksum and list entry names.
// Dependencies: tar, flate2, bzip2, xz2
// ============================================================================

//! ## Overview
//! Compression is identified by magic bytes, then the first 512-byte block of
//! the decompressed stream must be a tar header with a valid checksum.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;

use super::ArchiveError;
use super::ArchiveFormat;
use super::ArchiveKind;
use super::MAX_MEMBERS;
use super::TarCompression;

/// Tar header block size.
const BLOCK_SIZE: usize = 512;

/// Byte range of the header checksum field.
const CHECKSUM_RANGE: std::ops::Range<usize> = 148 .. 156;

/// Tar sniffer.
pub(super) struct TarFormat;

impl ArchiveFormat for TarFormat {
    fn sniff(&self, path: &Path) -> Option<ArchiveKind> {
        let compression = sniff_compression(path).ok()?;
        let mut stream = open_stream(path, compression).ok()?;
        let mut block = [0_u8; BLOCK_SIZE];
        stream.read_exact(&mut block).ok()?;
        header_checksum_valid(&block).then_some(ArchiveKind::Tar(compression))
    }

    fn members(&self, path: &Path, kind: ArchiveKind) -> Result<Vec<String>, ArchiveError> {
        let ArchiveKind::Tar(compression) = kind else {
            return Err(ArchiveError::Unsupported(format!("{kind} is not a tar archive")));
        };
        let mut archive = Archive::new(open_stream(path, compression)?);
        let mut members = Vec::new();
        for entry in archive.entries()? {
            let entry = entry?;
            if members.len() >= MAX_MEMBERS {
                return Err(ArchiveError::TooManyMembers {
                    max: MAX_MEMBERS,
                });
            }
            let mut name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            if entry.header().entry_type().is_dir() && !name.ends_with('/') {
                name.push('/');
            }
            members.push(name);
        }
        Ok(members)
    }
}

/// Identifies the compression wrapper from leading magic bytes.
fn sniff_compression(path: &Path) -> io::Result<TarCompression> {
    let mut magic = Vec::with_capacity(6);
    File::open(path)?.take(6).read_to_end(&mut magic)?;
    let compression = if magic.starts_with(&[0x1F, 0x8B]) {
        TarCompression::Gzip
    } else if magic.starts_with(b"BZh") {
        TarCompression::Bzip2
    } else if magic.starts_with(&[0xFD, b'7', b'z', b'X', b'Z', 0x00]) {
        TarCompression::Xz
    } else {
        TarCompression::None
    };
    Ok(compression)
}

/// Opens the decompressed tar stream.
fn open_stream(path: &Path, compression: TarCompression) -> io::Result<Box<dyn Read>> {
    let file = BufReader::new(File::open(path)?);
    let stream: Box<dyn Read> = match compression {
        TarCompression::None => Box::new(file),
        TarCompression::Gzip => Box::new(GzDecoder::new(file)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(file)),
        TarCompression::Xz => Box::new(XzDecoder::new(file)),
    };
    Ok(stream)
}

/// Validates a tar header block checksum (checksum field counted as spaces).
fn header_checksum_valid(block: &[u8; BLOCK_SIZE]) -> bool {
    if block.iter().all(|byte| *byte == 0) {
        return false;
    }
    let field = &block[CHECKSUM_RANGE];
    let digits: String = field
        .iter()
        .map(|byte| char::from(*byte))
        .filter(|ch| ch.is_digit(8))
        .collect();
    let Ok(declared) = u64::from_str_radix(&digits, 8) else {
        return false;
    };
    let computed: u64 = block
        .iter()
        .enumerate()
        .map(|(index, byte)| if CHECKSUM_RANGE.contains(&index) { 0x20 } else { u64::from(*byte) })
        .sum();
    declared == computed
}

// ============================================================================
// SECTION: Tests
// ============================================================================
