// crates/review-gate-core/src/core/mod.rs
// ============================================================================
// Module: Review Gate Core Types
// Description: Identities, changesets, and violations shared by every check.
// Purpose: Provide the per-request data model consumed read-only by validators.
// Dependencies: crate::core::{changeset, identity, violation}
// ============================================================================

//! ## Overview
//! Core types describe one proposed change under review. They are built fresh
//! for every review request and discarded once the verdict is reported.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod changeset;
pub mod identity;
pub mod violation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use changeset::ChangeKind;
pub use changeset::ChangedFile;
pub use changeset::Changeset;
pub use changeset::RepositoryId;
pub use identity::Identity;
pub use violation::Violation;
pub use violation::ViolationKind;
