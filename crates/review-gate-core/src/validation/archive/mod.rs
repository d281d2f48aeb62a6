// crates/review-gate-core/src/validation/archive/mod.rs
// ============================================================================
// Module: Archive Inspector
// Description: Archive format sniffing, member listing, and path confinement.
// Purpose: Ensure a package archive only installs files into its own namespace.
// Dependencies: crate::core, thiserror, zip, tar, flate2, bzip2, xz2
// ============================================================================

//! ## Overview
//! The inspector identifies a downloaded payload by content, never by file
//! extension. Formats are tried in a fixed order (zip, tar with any supported
//! compression, then RAR) and the first sniffer that matches wins. Member
//! names are normalized to forward slashes, with directory entries carrying a
//! trailing `/`.
//!
//! Confinement: every member must sit directly inside `<root>/<dir>` (or, in
//! the loose variant, anywhere below it). The bare `<root>/` directory entry
//! is always allowed. A payload member `<root>/<dir>/<dir>.<ext>` must exist.
//!
//! Security posture: archives are contributor-controlled; listings are capped
//! and absolute or parent-relative member paths are never confined.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod rar;
mod tarball;
mod zipfile;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::core::Violation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of members listed from one archive.
pub(crate) const MAX_MEMBERS: usize = 100_000;

/// Supported archive types as shown to contributors.
pub const SUPPORTED_TYPES: &str = "*.zip *.tar *.tar.gz *.tar.bz2 *.tar.xz *.rar";

/// Format sniffers in detection order.
const FORMATS: &[&dyn ArchiveFormat] =
    &[&zipfile::ZipFormat, &tarball::TarFormat, &rar::RarFormat];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Compression wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    /// Plain tar.
    None,
    /// gzip (`.tar.gz`).
    Gzip,
    /// bzip2 (`.tar.bz2`).
    Bzip2,
    /// xz (`.tar.xz`).
    Xz,
}

/// Detected archive container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Zip archive.
    Zip,
    /// Tar archive with the given compression.
    Tar(TarCompression),
    /// RAR archive (v4 or v5).
    Rar,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Zip => "zip",
            Self::Tar(TarCompression::None) => "tar",
            Self::Tar(TarCompression::Gzip) => "tar.gz",
            Self::Tar(TarCompression::Bzip2) => "tar.bz2",
            Self::Tar(TarCompression::Xz) => "tar.xz",
            Self::Rar => "rar",
        };
        f.write_str(label)
    }
}

/// Archive reading errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading the archive file failed.
    #[error("archive io error: {0}")]
    Io(String),
    /// Archive structure is invalid.
    #[error("archive is malformed: {0}")]
    Malformed(String),
    /// Archive uses a feature that cannot be listed.
    #[error("archive is unsupported: {0}")]
    Unsupported(String),
    /// Archive lists more members than allowed.
    #[error("archive has more than {max} members")]
    TooManyMembers {
        /// Maximum member count.
        max: usize,
    },
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Content-sniffing archive format.
trait ArchiveFormat: Sync {
    /// Returns the archive kind when the file matches this format.
    fn sniff(&self, path: &Path) -> Option<ArchiveKind>;

    /// Lists member names in archive order.
    fn members(&self, path: &Path, kind: ArchiveKind) -> Result<Vec<String>, ArchiveError>;
}

// ============================================================================
// SECTION: Inspector
// ============================================================================

/// Archive detection and confinement checks for one repository layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInspector {
    /// Install root directory inside archives (e.g. `3ds`).
    root: String,
    /// Payload extension without the dot (e.g. `3dsx`).
    payload_extension: String,
    /// Whether members must sit directly in `<root>/<dir>`.
    strict: bool,
}

impl ArchiveInspector {
    /// Creates an inspector for the given layout.
    #[must_use]
    pub fn new(root: impl Into<String>, payload_extension: impl Into<String>, strict: bool) -> Self {
        Self {
            root: root.into(),
            payload_extension: payload_extension.into(),
            strict,
        }
    }

    /// Detects the archive container by content.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Option<ArchiveKind> {
        FORMATS.iter().find_map(|format| format.sniff(path))
    }

    /// Lists normalized member names of a detected archive.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] when the archive cannot be read.
    pub fn members(&self, path: &Path, kind: ArchiveKind) -> Result<Vec<String>, ArchiveError> {
        let raw = match kind {
            ArchiveKind::Zip => zipfile::ZipFormat.members(path, kind)?,
            ArchiveKind::Tar(_) => tarball::TarFormat.members(path, kind)?,
            ArchiveKind::Rar => rar::RarFormat.members(path, kind)?,
        };
        Ok(raw.iter().map(|member| normalize_member(member)).collect())
    }

    /// Checks members against the confinement rule and the payload requirement.
    #[must_use]
    pub fn inspect(&self, members: &[String], declared_dir: &str) -> Vec<Violation> {
        let mut violations: Vec<Violation> = members
            .iter()
            .filter(|member| !is_confined(member, &self.root, declared_dir, self.strict))
            .map(|member| {
                Violation::archive(format!(
                    "Archive file `{member}` is not in a permitted location."
                ))
            })
            .collect();
        let payload = self.payload_member(declared_dir);
        if !members.iter().any(|member| *member == payload) {
            violations.push(Violation::archive(format!(
                "Archive is missing the required file `{payload}`."
            )));
        }
        violations
    }

    /// Returns the required payload member path for a package directory.
    #[must_use]
    pub fn payload_member(&self, declared_dir: &str) -> String {
        format!("{}/{declared_dir}/{declared_dir}.{}", self.root, self.payload_extension)
    }
}

/// Returns true when `member` may be installed for package `dir`.
#[must_use]
pub fn is_confined(member: &str, root: &str, dir: &str, strict: bool) -> bool {
    if member.strip_suffix('/') == Some(root) {
        return true;
    }
    if member.starts_with('/') || member.split('/').any(|segment| segment == "..") {
        return false;
    }
    let parent = parent_directory(member);
    let expected = format!("{root}/{dir}");
    if parent == expected {
        return true;
    }
    !strict && parent.strip_prefix(expected.as_str()).is_some_and(|rest| rest.starts_with('/'))
}

/// Returns the directory part of a member path (`a/b/` yields `a/b`).
fn parent_directory(member: &str) -> &str {
    member.rfind('/').map_or("", |index| member[.. index].trim_end_matches('/'))
}

/// Normalizes separators and strips a leading `./`.
fn normalize_member(member: &str) -> String {
    let normalized = member.replace('\\', "/");
    normalized.strip_prefix("./").map_or_else(|| normalized.clone(), str::to_string)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
