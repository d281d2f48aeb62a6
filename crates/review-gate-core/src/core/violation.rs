// crates/review-gate-core/src/core/violation.rs
// ============================================================================
// Module: Review Gate Violations
// Description: Human-readable review findings with a machine classification.
// Purpose: Collect every problem with a submission without aborting early.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Validators never throw on bad submissions; they return [`Violation`]
//! values. The orchestrator concatenates them in discovery order and renders
//! them as a bulleted review comment.

use std::fmt;

use serde::Serialize;

/// Classification of a review finding.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Actor may not modify the path.
    PermissionDenied,
    /// Missing, unknown, or malformed manifest field.
    SchemaError,
    /// Checksum or declared size mismatch.
    IntegrityError,
    /// Unrecognized archive, disallowed member path, or missing payload.
    ArchiveLayoutError,
    /// Image format or dimension mismatch.
    ImageError,
    /// Unreachable URL or failed download.
    NetworkError,
}

impl ViolationKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::SchemaError => "schema_error",
            Self::IntegrityError => "integrity_error",
            Self::ArchiveLayoutError => "archive_layout_error",
            Self::ImageError => "image_error",
            Self::NetworkError => "network_error",
        }
    }
}

/// Immutable review finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Machine classification.
    kind: ViolationKind,
    /// Message shown to the contributor.
    message: String,
}

impl Violation {
    /// Creates a violation of the given kind.
    #[must_use]
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a [`ViolationKind::PermissionDenied`] violation.
    #[must_use]
    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::PermissionDenied, message)
    }

    /// Creates a [`ViolationKind::SchemaError`] violation.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::SchemaError, message)
    }

    /// Creates a [`ViolationKind::IntegrityError`] violation.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::IntegrityError, message)
    }

    /// Creates a [`ViolationKind::ArchiveLayoutError`] violation.
    #[must_use]
    pub fn archive(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::ArchiveLayoutError, message)
    }

    /// Creates a [`ViolationKind::ImageError`] violation.
    #[must_use]
    pub fn image(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::ImageError, message)
    }

    /// Creates a [`ViolationKind::NetworkError`] violation.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::NetworkError, message)
    }

    /// Returns the classification.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Returns the contributor-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
