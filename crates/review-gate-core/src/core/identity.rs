// crates/review-gate-core/src/core/identity.rs
// ============================================================================
// Module: Review Gate Identity
// Description: Acting contributor identity for a reviewed change.
// Purpose: Carry the login, profile link, and trusted-member flag.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Identity`] is the committer of the reviewed commit. Trusted identities
//! (organization members) bypass every directory permission check.

use serde::Deserialize;
use serde::Serialize;

/// Contributor identity attached to a changeset.
///
/// # Invariants
/// - `login` is the host account name used for policy lookups.
/// - `trusted` grants universal edit rights when true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Host account login.
    pub login: String,
    /// Public profile URL used when rendering violations.
    pub profile_url: String,
    /// Whether the identity belongs to the trusted organization.
    pub trusted: bool,
}

impl Identity {
    /// Creates an untrusted identity.
    #[must_use]
    pub fn new(login: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            profile_url: profile_url.into(),
            trusted: false,
        }
    }

    /// Returns the identity with the trusted flag set.
    #[must_use]
    pub const fn trusted(mut self) -> Self {
        self.trusted = true;
        self
    }

    /// Renders the identity as a Markdown link.
    #[must_use]
    pub fn markdown_link(&self) -> String {
        format!("[{}]({})", self.login, self.profile_url)
    }
}
