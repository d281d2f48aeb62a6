// crates/review-gate-core/src/lib.rs
// ============================================================================
// Module: Review Gate Core Library
// Description: Public API surface for the Review Gate core.
// Purpose: Expose submission types, validators, interfaces, and the orchestrator.
// Dependencies: crate::{core, interfaces, validation, runtime}
// ============================================================================

//! ## Overview
//! Review Gate core decides whether a proposed change to a community package
//! repository may be merged. It evaluates path-scoped edit permissions, checks
//! package manifests against a closed schema, verifies the declared payload
//! archive (size, checksum, member confinement), and validates icon and
//! screenshot images. Every outside system is reached through the
//! [`Fetcher`] and [`HostClient`] interfaces.
//!
//! Security posture: URLs, archives, images, and manifest text are all
//! contributor-controlled and treated as hostile; downloads are size-capped
//! and spooled to scoped temporary storage.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::FetchError;
pub use interfaces::FetchStream;
pub use interfaces::Fetcher;
pub use interfaces::HostClient;
pub use interfaces::HostError;
pub use interfaces::PullRequestState;
pub use interfaces::fetch_limited;
pub use runtime::APPROVAL_COMMENT;
pub use runtime::RejectReason;
pub use runtime::ReviewError;
pub use runtime::ReviewOrchestrator;
pub use runtime::ReviewReport;
pub use runtime::ReviewSettings;
pub use runtime::SkipReason;
pub use runtime::Verdict;
pub use runtime::rejection_comment;
pub use runtime::squash_comment;
pub use validation::AccessPolicy;
pub use validation::ArchiveError;
pub use validation::ArchiveInspector;
pub use validation::ArchiveKind;
pub use validation::ChangesetAuthorizer;
pub use validation::DirectoryDecision;
pub use validation::EVERYONE;
pub use validation::FieldValue;
pub use validation::Manifest;
pub use validation::ManifestValidator;
pub use validation::PolicyParseError;
pub use validation::SpooledDownload;
pub use validation::ValidationLimits;
pub use validation::check_icon;
pub use validation::check_screenshot;
pub use validation::spool_download;
