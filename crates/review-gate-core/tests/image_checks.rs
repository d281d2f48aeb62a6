// crates/review-gate-core/tests/image_checks.rs
// ============================================================================
// Module: Image Check Tests
// Description: Icon header law and screenshot decoding checks.
// Purpose: Ensure image checks yield exactly one finding per failed file.
// Dependencies: review-gate-core, image
// ============================================================================

//! Icon and screenshot checks over synthetic headers and encoded images.

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

use image::ImageFormat;
use review_gate_core::ViolationKind;
use review_gate_core::check_icon;
use review_gate_core::check_screenshot;

use crate::common::encoded_image;
use crate::common::png_header;

/// Label used in icon messages.
const ICON: &str = "[icon.png](https://blob.example/apps/a/icon.png)";

#[test]
fn correct_icon_header_passes() {
    assert_eq!(check_icon(ICON, &png_header(48, 48), 48, 48), None);
}

#[test]
fn real_png_icon_passes() {
    assert_eq!(check_icon(ICON, &encoded_image(48, 48, ImageFormat::Png), 48, 48), None);
}

#[test]
fn wrong_dimensions_cite_found_and_required_sizes() {
    let violation = check_icon(ICON, &png_header(64, 64), 48, 48).unwrap();
    assert_eq!(violation.kind(), ViolationKind::ImageError);
    assert_eq!(violation.message(), format!("{ICON} dimensions need to be 48x48 (found 64x64)"));
}

#[test]
fn missing_magic_is_one_violation_regardless_of_dimensions() {
    let mut bytes = png_header(64, 64);
    bytes[1] = b'J';
    let violation = check_icon(ICON, &bytes, 48, 48).unwrap();
    assert_eq!(violation.message(), format!("{ICON} is not a valid PNG."));
    let jpeg = encoded_image(48, 48, ImageFormat::Jpeg);
    assert_eq!(check_icon(ICON, &jpeg, 48, 48).unwrap().message(), format!("{ICON} is not a valid PNG."));
}

#[test]
fn truncated_or_empty_icons_are_not_images() {
    assert_eq!(check_icon(ICON, &[], 48, 48).unwrap().message(), format!("{ICON} is not a valid image."));
    let truncated = &png_header(48, 48)[.. 12];
    assert_eq!(
        check_icon(ICON, truncated, 48, 48).unwrap().message(),
        format!("{ICON} has a malformed PNG header.")
    );
}

#[test]
fn wrong_chunk_length_is_malformed() {
    let mut bytes = png_header(48, 48);
    bytes[11] = 12;
    assert!(check_icon(ICON, &bytes, 48, 48).unwrap().message().contains("malformed"));
}

#[test]
fn screenshot_png_and_jpeg_of_exact_size_pass() {
    let url = "https://i.imgur.com/a.png";
    assert_eq!(check_screenshot(url, &encoded_image(400, 480, ImageFormat::Png), 400, 480), None);
    assert_eq!(check_screenshot(url, &encoded_image(400, 480, ImageFormat::Jpeg), 400, 480), None);
}

#[test]
fn screenshot_wrong_size_is_reported() {
    let url = "https://i.imgur.com/a.png";
    let violation =
        check_screenshot(url, &encoded_image(480, 400, ImageFormat::Png), 400, 480).unwrap();
    assert!(violation.message().contains("found 480x400"), "{}", violation.message());
}

#[test]
fn screenshot_garbage_is_not_an_image() {
    let violation = check_screenshot("https://i.imgur.com/a.png", b"not an image", 400, 480).unwrap();
    assert_eq!(violation.kind(), ViolationKind::ImageError);
}
