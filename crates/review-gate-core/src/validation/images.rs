// crates/review-gate-core/src/validation/images.rs
// ============================================================================
// Module: Image Checks
// Description: Icon header authentication and screenshot decoding checks.
// Purpose: Verify image format and exact pixel dimensions.
// Dependencies: crate::core, image
// ============================================================================

//! ## Overview
//! Icons are authenticated from their PNG header alone: the 8-byte signature
//! followed by an IHDR chunk whose big-endian width and height must match
//! exactly. Each header parse yields at most one violation. Screenshots are
//! decoded in full with the `image` crate, which must report PNG or JPEG.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;

use image::ImageFormat;
use image::ImageReader;
use image::Limits;

use crate::core::Violation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Required IHDR chunk data length.
const IHDR_LENGTH: u32 = 13;

/// Bytes needed to read the IHDR width and height.
const IHDR_HEADER_END: usize = 24;

/// Upper bound on decoded screenshot dimensions.
const MAX_DECODE_DIMENSION: u32 = 4096;

/// Upper bound on decoder allocations.
const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

// ============================================================================
// SECTION: Icon
// ============================================================================

/// Checks an icon's PNG header against the required dimensions.
///
/// `label` identifies the file in the message (usually a Markdown link).
/// Returns `None` when the icon is a PNG of exactly `width` x `height`.
#[must_use]
pub fn check_icon(label: &str, bytes: &[u8], width: u32, height: u32) -> Option<Violation> {
    if bytes.len() < PNG_SIGNATURE.len() {
        return Some(Violation::image(format!("{label} is not a valid image.")));
    }
    if bytes[.. PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Some(Violation::image(format!("{label} is not a valid PNG.")));
    }
    let Some(header) = bytes.get(.. IHDR_HEADER_END) else {
        return Some(Violation::image(format!("{label} has a malformed PNG header.")));
    };
    let chunk_length = read_u32(&header[8 .. 12]);
    if chunk_length != IHDR_LENGTH || &header[12 .. 16] != b"IHDR" {
        return Some(Violation::image(format!("{label} has a malformed PNG header.")));
    }
    let found_width = read_u32(&header[16 .. 20]);
    let found_height = read_u32(&header[20 .. 24]);
    if found_width == width && found_height == height {
        return None;
    }
    Some(Violation::image(format!(
        "{label} dimensions need to be {width}x{height} (found {found_width}x{found_height})"
    )))
}

/// Reads a big-endian `u32` from a four-byte slice.
fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&bytes[.. 4]);
    u32::from_be_bytes(raw)
}

// ============================================================================
// SECTION: Screenshot
// ============================================================================

/// Decodes a screenshot and checks its format and dimensions.
///
/// Returns `None` when the image decodes as PNG or JPEG at exactly
/// `width` x `height`.
#[must_use]
pub fn check_screenshot(url: &str, bytes: &[u8], width: u32, height: u32) -> Option<Violation> {
    let Ok(mut reader) = ImageReader::new(Cursor::new(bytes)).with_guessed_format() else {
        return Some(Violation::image(format!("Screenshot `{url}` is not a valid image.")));
    };
    match reader.format() {
        Some(ImageFormat::Png | ImageFormat::Jpeg) => {}
        _ => {
            return Some(Violation::image(format!(
                "Screenshot `{url}` must be a PNG or JPEG image."
            )));
        }
    }
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    reader.limits(limits);
    let Ok(decoded) = reader.decode() else {
        return Some(Violation::image(format!("Screenshot `{url}` is not a valid image.")));
    };
    if decoded.width() == width && decoded.height() == height {
        return None;
    }
    Some(Violation::image(format!(
        "Screenshot `{url}` dimensions need to be {width}x{height} (found {}x{})",
        decoded.width(),
        decoded.height()
    )))
}
