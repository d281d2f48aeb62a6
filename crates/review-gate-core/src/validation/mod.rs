// crates/review-gate-core/src/validation/mod.rs
// ============================================================================
// Module: Review Gate Validation
// Description: Permission, manifest, archive, and image checks.
// Purpose: Turn one changed file into the complete list of its violations.
// Dependencies: crate::validation::{access, archive, download, images, manifest, validator}
// ============================================================================

//! ## Overview
//! Validation checks are composable and collect findings rather than
//! failing fast. Only the archive integrity stage is gated: it runs after the
//! schema and per-field checks come back clean.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod archive;
pub mod download;
pub mod images;
pub mod manifest;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessPolicy;
pub use access::ChangesetAuthorizer;
pub use access::DirectoryDecision;
pub use access::EVERYONE;
pub use access::FileAuthorization;
pub use access::PolicyParseError;
pub use access::normalize_directory;
pub use archive::ArchiveError;
pub use archive::ArchiveInspector;
pub use archive::ArchiveKind;
pub use archive::SUPPORTED_TYPES;
pub use archive::TarCompression;
pub use archive::is_confined;
pub use download::SpooledDownload;
pub use download::spool_download;
pub use images::PNG_SIGNATURE;
pub use images::check_icon;
pub use images::check_screenshot;
pub use manifest::FieldSpec;
pub use manifest::FieldType;
pub use manifest::FieldValue;
pub use manifest::MANIFEST_SCHEMA;
pub use manifest::Manifest;
pub use manifest::ManifestEntry;
pub use validator::ManifestValidator;
pub use validator::ValidationLimits;
