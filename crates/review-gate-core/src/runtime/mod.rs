// crates/review-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Review Gate Runtime
// Description: Review orchestration for one pull request.
// Purpose: Sequence permission and artifact checks into a merge decision.
// Dependencies: crate::{core, interfaces, validation}
// ============================================================================

//! ## Overview
//! The runtime owns the review state machine. Every outer surface (webhook
//! server, CLI) calls [`ReviewOrchestrator::review`] so a pull request is
//! judged the same way regardless of how the review was triggered.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod review;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use review::APPROVAL_COMMENT;
pub use review::RejectReason;
pub use review::ReviewError;
pub use review::ReviewOrchestrator;
pub use review::ReviewReport;
pub use review::ReviewSettings;
pub use review::SkipReason;
pub use review::Verdict;
pub use review::rejection_comment;
pub use review::squash_comment;
