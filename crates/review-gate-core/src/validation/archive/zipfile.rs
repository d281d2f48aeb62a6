// crates/review-gate-core/src/validation/archive/zipfile.rs
// ============================================================================
// Module: Zip Format
// Description: Zip detection and member listing.
// Purpose: Read zip central directory names without extracting data.
// Dependencies: zip
// ============================================================================

use std::fs::File;
use std::path::Path;

use zip::ZipArchive;

use super::ArchiveError;
use super::ArchiveFormat;
use super::ArchiveKind;
use super::MAX_MEMBERS;

/// Zip sniffer; matches when the central directory parses.
pub(super) struct ZipFormat;

impl ArchiveFormat for ZipFormat {
    fn sniff(&self, path: &Path) -> Option<ArchiveKind> {
        let file = File::open(path).ok()?;
        ZipArchive::new(file).ok().map(|_| ArchiveKind::Zip)
    }

    fn members(&self, path: &Path, _kind: ArchiveKind) -> Result<Vec<String>, ArchiveError> {
        let file = File::open(path)?;
        let mut archive =
            ZipArchive::new(file).map_err(|err| ArchiveError::Malformed(err.to_string()))?;
        if archive.len() > MAX_MEMBERS {
            return Err(ArchiveError::TooManyMembers {
                max: MAX_MEMBERS,
            });
        }
        let mut members = Vec::with_capacity(archive.len());
        for index in 0 .. archive.len() {
            let entry =
                archive.by_index_raw(index).map_err(|err| ArchiveError::Malformed(err.to_string()))?;
            members.push(entry.name().to_string());
        }
        Ok(members)
    }
}
