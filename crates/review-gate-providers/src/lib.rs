// crates/review-gate-providers/src/lib.rs
// ============================================================================
// Module: Review Gate Providers
// Description: Network-backed fetcher and host client implementations.
// Purpose: Connect the review pipeline to the web and to GitHub.
// Dependencies: review-gate-core, reqwest, serde, serde_json, base64, url
// ============================================================================

//! ## Overview
//! This crate provides the production implementations of the core
//! [`review_gate_core::Fetcher`] and [`review_gate_core::HostClient`]
//! interfaces. Both use blocking `reqwest` clients with redirects disabled;
//! the fetcher re-validates every redirect hop itself.
//!
//! Security posture: fetched URLs are contributor-controlled; private network
//! targets are denied unless configuration opts in.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fetch;
pub mod github;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fetch::HttpFetcher;
pub use fetch::HttpFetcherConfig;
pub use github::GitHubClient;
pub use github::GitHubConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

use thiserror::Error;

/// Provider construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider configuration is unusable.
    #[error("provider config invalid: {0}")]
    Config(String),
    /// No API token was supplied.
    #[error("host api token is missing")]
    MissingToken,
    /// HTTP client construction failed.
    #[error("http client build failed: {0}")]
    Client(String),
}
