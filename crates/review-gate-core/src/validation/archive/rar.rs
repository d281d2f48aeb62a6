// crates/review-gate-core/src/validation/archive/rar.rs
// ============================================================================
// Module: RAR Format
// Description: RAR v4 and v5 detection and header-walking member listing.
// Purpose: List RAR member names without decompressing any data.
// Dependencies: std
// ============================================================================

//! ## Overview
//! RAR archives are listed by walking block headers and seeking over packed
//! data. Archives with encrypted headers cannot be listed and are reported
//! as unsupported. Directory entries gain a trailing `/`.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

use super::ArchiveError;
use super::ArchiveFormat;
use super::ArchiveKind;
use super::MAX_MEMBERS;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// RAR 1.5 to 4.x signature.
const RAR4_SIGNATURE: &[u8] = b"Rar!\x1A\x07\x00";
/// RAR 5.0 signature.
const RAR5_SIGNATURE: &[u8] = b"Rar!\x1A\x07\x01\x00";

/// RAR4 main archive header type.
const RAR4_MAIN_HEAD: u8 = 0x73;
/// RAR4 file header type.
const RAR4_FILE_HEAD: u8 = 0x74;
/// RAR4 end of archive header type.
const RAR4_END_HEAD: u8 = 0x7B;
/// RAR4 main header flag: block headers are encrypted.
const RAR4_MHD_PASSWORD: u16 = 0x0080;
/// RAR4 block flag: ADD_SIZE field present.
const RAR4_LONG_BLOCK: u16 = 0x8000;
/// RAR4 file flag: 64-bit size fields present.
const RAR4_LARGE: u16 = 0x0100;
/// RAR4 file flag: name carries a Unicode tail after NUL.
const RAR4_UNICODE: u16 = 0x0200;
/// RAR4 file flags mask and value marking a directory.
const RAR4_DIRECTORY: u16 = 0x00E0;

/// RAR5 file header type.
const RAR5_FILE_HEAD: u64 = 2;
/// RAR5 archive encryption header type.
const RAR5_ENCRYPTION_HEAD: u64 = 4;
/// RAR5 end of archive header type.
const RAR5_END_HEAD: u64 = 5;
/// Largest RAR5 header accepted.
const RAR5_MAX_HEADER: u64 = 2 * 1024 * 1024;

// ============================================================================
// SECTION: Format
// ============================================================================

/// RAR sniffer.
pub(super) struct RarFormat;

/// RAR container generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RarVersion {
    /// RAR 1.5 to 4.x.
    V4,
    /// RAR 5.0.
    V5,
}

impl ArchiveFormat for RarFormat {
    fn sniff(&self, path: &Path) -> Option<ArchiveKind> {
        read_version(path).ok().flatten().map(|_| ArchiveKind::Rar)
    }

    fn members(&self, path: &Path, _kind: ArchiveKind) -> Result<Vec<String>, ArchiveError> {
        let version = read_version(path)?
            .ok_or_else(|| ArchiveError::Malformed("missing RAR signature".to_string()))?;
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        match version {
            RarVersion::V4 => list_rar4(&mut reader, file_len),
            RarVersion::V5 => list_rar5(&mut reader, file_len),
        }
    }
}

/// Reads the signature and returns the container generation.
fn read_version(path: &Path) -> Result<Option<RarVersion>, ArchiveError> {
    let mut magic = Vec::with_capacity(RAR5_SIGNATURE.len());
    File::open(path)?.take(8).read_to_end(&mut magic)?;
    if magic.starts_with(RAR5_SIGNATURE) {
        Ok(Some(RarVersion::V5))
    } else if magic.starts_with(RAR4_SIGNATURE) {
        Ok(Some(RarVersion::V4))
    } else {
        Ok(None)
    }
}

// ============================================================================
// SECTION: RAR4
// ============================================================================

/// Walks RAR4 blocks and collects file names.
fn list_rar4<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<Vec<String>, ArchiveError> {
    let mut members = Vec::new();
    let mut position = RAR4_SIGNATURE.len() as u64;
    while position < file_len {
        reader.seek(SeekFrom::Start(position))?;
        let mut base = [0_u8; 7];
        reader.read_exact(&mut base)?;
        let head_type = base[2];
        let flags = u16::from_le_bytes([base[3], base[4]]);
        let head_size = u16::from_le_bytes([base[5], base[6]]);
        let Some(body_len) = usize::from(head_size).checked_sub(base.len()) else {
            return Err(ArchiveError::Malformed("RAR block header too short".to_string()));
        };
        let mut body = vec![0_u8; body_len];
        reader.read_exact(&mut body)?;
        if head_type == RAR4_MAIN_HEAD && flags & RAR4_MHD_PASSWORD != 0 {
            return Err(ArchiveError::Unsupported("RAR headers are encrypted".to_string()));
        }
        let add_size = if head_type == RAR4_FILE_HEAD {
            let (name, packed) = parse_rar4_file(&body, flags)?;
            if members.len() >= MAX_MEMBERS {
                return Err(ArchiveError::TooManyMembers {
                    max: MAX_MEMBERS,
                });
            }
            members.push(name);
            packed
        } else if flags & RAR4_LONG_BLOCK != 0 {
            u64::from(le_u32(&body, 0)?)
        } else {
            0
        };
        if head_type == RAR4_END_HEAD {
            break;
        }
        position = position
            .checked_add(u64::from(head_size))
            .and_then(|next| next.checked_add(add_size))
            .ok_or_else(|| ArchiveError::Malformed("RAR block size overflow".to_string()))?;
    }
    Ok(members)
}

/// Parses a RAR4 file header body, returning the name and packed data size.
fn parse_rar4_file(body: &[u8], flags: u16) -> Result<(String, u64), ArchiveError> {
    let mut packed = u64::from(le_u32(body, 0)?);
    let name_size = usize::from(u16::from_le_bytes([byte_at(body, 19)?, byte_at(body, 20)?]));
    let mut name_offset = 25;
    if flags & RAR4_LARGE != 0 {
        packed |= u64::from(le_u32(body, 25)?) << 32;
        name_offset = 33;
    }
    let raw_name = body
        .get(name_offset .. name_offset + name_size)
        .ok_or_else(|| ArchiveError::Malformed("RAR file name out of bounds".to_string()))?;
    let raw_name = if flags & RAR4_UNICODE != 0 {
        raw_name.split(|byte| *byte == 0).next().unwrap_or(raw_name)
    } else {
        raw_name
    };
    let mut name = String::from_utf8_lossy(raw_name).into_owned();
    if flags & RAR4_DIRECTORY == RAR4_DIRECTORY && !name.ends_with(['/', '\\']) {
        name.push('/');
    }
    Ok((name, packed))
}

/// Reads a byte at `offset`.
fn byte_at(bytes: &[u8], offset: usize) -> Result<u8, ArchiveError> {
    bytes
        .get(offset)
        .copied()
        .ok_or_else(|| ArchiveError::Malformed("RAR header truncated".to_string()))
}

/// Reads a little-endian `u32` at `offset`.
fn le_u32(bytes: &[u8], offset: usize) -> Result<u32, ArchiveError> {
    let raw = bytes
        .get(offset .. offset + 4)
        .ok_or_else(|| ArchiveError::Malformed("RAR header truncated".to_string()))?;
    let mut buffer = [0_u8; 4];
    buffer.copy_from_slice(raw);
    Ok(u32::from_le_bytes(buffer))
}

// ============================================================================
// SECTION: RAR5
// ============================================================================

/// Walks RAR5 headers and collects file names.
fn list_rar5<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<Vec<String>, ArchiveError> {
    let mut members = Vec::new();
    let mut position = RAR5_SIGNATURE.len() as u64;
    while position < file_len {
        reader.seek(SeekFrom::Start(position))?;
        let mut crc = [0_u8; 4];
        reader.read_exact(&mut crc)?;
        let (header_size, size_len) = read_stream_vint(reader)?;
        if header_size == 0 || header_size > RAR5_MAX_HEADER {
            return Err(ArchiveError::Malformed("RAR header size out of range".to_string()));
        }
        let header_len = usize::try_from(header_size)
            .map_err(|_| ArchiveError::Malformed("RAR header size out of range".to_string()))?;
        let mut header = vec![0_u8; header_len];
        reader.read_exact(&mut header)?;
        let mut cursor = HeaderCursor::new(&header);
        let head_type = cursor.vint()?;
        let head_flags = cursor.vint()?;
        if head_flags & 0x1 != 0 {
            cursor.vint()?;
        }
        let data_size = if head_flags & 0x2 != 0 { cursor.vint()? } else { 0 };
        match head_type {
            RAR5_ENCRYPTION_HEAD => {
                return Err(ArchiveError::Unsupported("RAR headers are encrypted".to_string()));
            }
            RAR5_FILE_HEAD => {
                if members.len() >= MAX_MEMBERS {
                    return Err(ArchiveError::TooManyMembers {
                        max: MAX_MEMBERS,
                    });
                }
                members.push(parse_rar5_file(&mut cursor)?);
            }
            RAR5_END_HEAD => break,
            _ => {}
        }
        position = position
            .checked_add(4 + size_len)
            .and_then(|next| next.checked_add(header_size))
            .and_then(|next| next.checked_add(data_size))
            .ok_or_else(|| ArchiveError::Malformed("RAR block size overflow".to_string()))?;
    }
    Ok(members)
}

/// Parses the type-specific part of a RAR5 file header.
fn parse_rar5_file(cursor: &mut HeaderCursor<'_>) -> Result<String, ArchiveError> {
    let file_flags = cursor.vint()?;
    cursor.vint()?;
    cursor.vint()?;
    if file_flags & 0x2 != 0 {
        cursor.take(4)?;
    }
    if file_flags & 0x4 != 0 {
        cursor.take(4)?;
    }
    cursor.vint()?;
    cursor.vint()?;
    let name_len = usize::try_from(cursor.vint()?)
        .map_err(|_| ArchiveError::Malformed("RAR name length out of range".to_string()))?;
    let mut name = String::from_utf8_lossy(cursor.take(name_len)?).into_owned();
    if file_flags & 0x1 != 0 && !name.ends_with('/') {
        name.push('/');
    }
    Ok(name)
}

/// Reads a RAR5 variable-length integer from a stream, returning its byte length.
fn read_stream_vint<R: Read>(reader: &mut R) -> Result<(u64, u64), ArchiveError> {
    let mut value: u64 = 0;
    for index in 0 .. 10_u32 {
        let mut byte = [0_u8; 1];
        reader.read_exact(&mut byte)?;
        value |= u64::from(byte[0] & 0x7F) << (7 * index);
        if byte[0] & 0x80 == 0 {
            return Ok((value, u64::from(index) + 1));
        }
    }
    Err(ArchiveError::Malformed("RAR integer too long".to_string()))
}

/// Bounds-checked reader over one RAR5 header.
struct HeaderCursor<'a> {
    /// Header bytes after the size field.
    bytes: &'a [u8],
    /// Read offset.
    offset: usize,
}

impl<'a> HeaderCursor<'a> {
    /// Starts reading at the beginning of the header.
    const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
        }
    }

    /// Takes `len` raw bytes.
    fn take(&mut self, len: usize) -> Result<&'a [u8], ArchiveError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| ArchiveError::Malformed("RAR header truncated".to_string()))?;
        let slice = &self.bytes[self.offset .. end];
        self.offset = end;
        Ok(slice)
    }

    /// Reads a variable-length integer.
    fn vint(&mut self) -> Result<u64, ArchiveError> {
        let mut value: u64 = 0;
        for index in 0 .. 10_u32 {
            let byte = self.take(1)?[0];
            value |= u64::from(byte & 0x7F) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ArchiveError::Malformed("RAR integer too long".to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
