// crates/review-gate-core/tests/archive_inspector.rs
// ============================================================================
// Module: Archive Inspector Tests
// Description: Format sniffing, member listing, and confinement checks.
// Purpose: Ensure archives can only install into their own package namespace.
// Dependencies: review-gate-core, zip, tar, flate2, tempfile, proptest
// ============================================================================

//! ## Overview
//! Tests the archive inspector for:
//! - Detection by content in zip, tar, RAR order
//! - Member normalization across formats
//! - Confinement and required-member laws
//! - Adversarial paths (parent segments, absolute paths, sibling packages)

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use proptest::prelude::*;
use review_gate_core::ArchiveInspector;
use review_gate_core::ArchiveKind;
use review_gate_core::ViolationKind;
use review_gate_core::validation::TarCompression;
use review_gate_core::validation::is_confined;
use tempfile::NamedTempFile;

use crate::common::zip_bytes;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Default inspector for the `3ds` layout.
fn inspector() -> ArchiveInspector {
    ArchiveInspector::new("3ds", "3dsx", true)
}

/// Writes bytes to a temporary file.
fn temp_with(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Builds a tar stream with the given members; names ending in `/` are directories.
fn tar_bytes<W: Write>(writer: W, members: &[&str]) -> W {
    let mut builder = tar::Builder::new(writer);
    for member in members {
        let mut header = tar::Header::new_gnu();
        if let Some(dir) = member.strip_suffix('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, dir, std::io::empty()).unwrap();
        } else {
            header.set_size(7);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, member, &b"payload"[..]).unwrap();
        }
    }
    builder.into_inner().unwrap()
}

/// Converts string slices to owned member names.
fn owned(members: &[&str]) -> Vec<String> {
    members.iter().map(|member| (*member).to_string()).collect()
}

// ============================================================================
// SECTION: Detection
// ============================================================================

#[test]
fn zip_is_detected_and_listed() {
    let file = temp_with(&zip_bytes(&["3ds/", "3ds/app1/", "3ds/app1/app1.3dsx"]));
    let kind = inspector().detect(file.path()).unwrap();
    assert_eq!(kind, ArchiveKind::Zip);
    let members = inspector().members(file.path(), kind).unwrap();
    assert_eq!(members, owned(&["3ds/", "3ds/app1/", "3ds/app1/app1.3dsx"]));
}

#[test]
fn gzip_tar_is_detected_with_directory_slashes() {
    let encoder = tar_bytes(GzEncoder::new(Vec::new(), Compression::default()), &[
        "3ds/",
        "3ds/app1/",
        "3ds/app1/app1.3dsx",
    ]);
    let file = temp_with(&encoder.finish().unwrap());
    let kind = inspector().detect(file.path()).unwrap();
    assert_eq!(kind, ArchiveKind::Tar(TarCompression::Gzip));
    let members = inspector().members(file.path(), kind).unwrap();
    assert_eq!(members, owned(&["3ds/", "3ds/app1/", "3ds/app1/app1.3dsx"]));
}

#[test]
fn plain_tar_is_detected() {
    let bytes = tar_bytes(Vec::new(), &["3ds/app1/app1.3dsx"]);
    let file = temp_with(&bytes);
    assert_eq!(inspector().detect(file.path()), Some(ArchiveKind::Tar(TarCompression::None)));
}

#[test]
fn rar_signature_is_detected_after_zip_and_tar() {
    let mut bytes = b"Rar!\x1A\x07\x01\x00".to_vec();
    bytes.extend([0, 0, 0, 0, 3, 5, 0, 0]);
    let file = temp_with(&bytes);
    assert_eq!(inspector().detect(file.path()), Some(ArchiveKind::Rar));
    assert!(inspector().members(file.path(), ArchiveKind::Rar).unwrap().is_empty());
}

#[test]
fn zip_wins_when_tar_data_precedes_it() {
    let mut bytes = tar_bytes(Vec::new(), &["3ds/other/evil.bin"]);
    bytes.extend(zip_bytes(&["3ds/", "3ds/app1/", "3ds/app1/app1.3dsx"]));
    let file = temp_with(&bytes);
    let kind = inspector().detect(file.path()).unwrap();
    assert_eq!(kind, ArchiveKind::Zip);
    let members = inspector().members(file.path(), kind).unwrap();
    assert_eq!(members, owned(&["3ds/", "3ds/app1/", "3ds/app1/app1.3dsx"]));
}

#[test]
fn unknown_content_is_not_an_archive() {
    let file = temp_with(&[b'x'; 2048]);
    assert_eq!(inspector().detect(file.path()), None);
    let empty = temp_with(&[]);
    assert_eq!(inspector().detect(empty.path()), None);
}

// ============================================================================
// SECTION: Confinement
// ============================================================================

#[test]
fn confinement_examples() {
    assert!(!is_confined("3ds/other/evil.bin", "3ds", "foo", true));
    assert!(is_confined("3ds/foo/data.bin", "3ds", "foo", true));
    assert!(is_confined("3ds/", "3ds", "foo", true));
    assert!(is_confined("3ds/foo/", "3ds", "foo", true));
    assert!(!is_confined("3ds/foobar/x", "3ds", "foo", false));
    assert!(is_confined("3ds/foo/sub/x", "3ds", "foo", false));
    assert!(!is_confined("3ds/foo/sub/x", "3ds", "foo", true));
    assert!(!is_confined("3ds/foo/../bar/x", "3ds", "foo", false));
    assert!(!is_confined("/3ds/foo/x", "3ds", "foo", true));
    assert!(!is_confined("3ds", "3ds", "foo", true));
}

#[test]
fn inspect_flags_each_stray_member_by_name() {
    let violations = inspector().inspect(
        &owned(&["3ds/", "3ds/foo/foo.3dsx", "3ds/other/evil.bin", "readme.txt"]),
        "foo",
    );
    assert_eq!(violations.len(), 2);
    assert_eq!(
        violations[0].message(),
        "Archive file `3ds/other/evil.bin` is not in a permitted location."
    );
    assert_eq!(violations[1].message(), "Archive file `readme.txt` is not in a permitted location.");
}

#[test]
fn missing_payload_is_reported_even_when_confined() {
    let violations = inspector().inspect(&owned(&["3ds/", "3ds/foo/", "3ds/foo/data.bin"]), "foo");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind(), ViolationKind::ArchiveLayoutError);
    assert!(violations[0].message().contains("3ds/foo/foo.3dsx"));
}

proptest! {
    #[test]
    fn sibling_packages_are_never_confined(
        dir in "[a-z]{1,8}",
        other in "[a-z]{1,8}",
        name in "[a-z]{1,8}\\.[a-z]{1,4}",
    ) {
        prop_assume!(dir != other);
        let member = format!("3ds/{other}/{name}");
        prop_assert!(!is_confined(&member, "3ds", &dir, true));
        prop_assert!(!is_confined(&member, "3ds", &dir, false));
    }

    #[test]
    fn own_package_members_are_confined(dir in "[a-z]{1,8}", name in "[a-z]{1,8}\\.[a-z]{1,4}") {
        let member = format!("3ds/{dir}/{name}");
        prop_assert!(is_confined(&member, "3ds", &dir, true));
    }
}
