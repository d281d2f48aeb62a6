// crates/review-gate-config/src/lib.rs
// ============================================================================
// Module: Review Gate Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for review-gate.toml semantics.
// Dependencies: review-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `review-gate-config` defines the configuration model for the review bot:
//! listener settings, host API access, outbound fetch policy, validation
//! limits, review retry bounds, and audit logging. Loading is strict and
//! fail-closed.
//!
//! Security posture: config inputs are untrusted and bounded before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
