// crates/review-gate-server/src/webhook.rs
// ============================================================================
// Module: Webhook Deliveries
// Description: Classification of inbound host webhook deliveries.
// Purpose: Decide whether a delivery schedules a pull request review.
// Dependencies: review-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A delivery schedules a review only when the event header is
//! `pull_request`, the action is one that changes the proposed content, and
//! the payload names both the repository and the pull request. Everything
//! else is acknowledged and ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use review_gate_core::RepositoryId;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the host event name.
pub const EVENT_HEADER: &str = "x-github-event";
/// Event name for pull request deliveries.
pub const PULL_REQUEST_EVENT: &str = "pull_request";
/// Pull request actions that schedule a review.
pub const REVIEW_ACTIONS: [&str; 3] = ["opened", "reopened", "synchronize"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pull request selected for review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewTarget {
    /// Repository identifier.
    pub repo: RepositoryId,
    /// Pull request number.
    pub number: u64,
}

/// Why a delivery did not schedule a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Event header missing or not a pull request event.
    EventNotHandled,
    /// Pull request action does not change content.
    ActionNotHandled,
    /// Payload is not JSON or lacks the repository or number.
    MalformedPayload,
    /// Body exceeded the configured size limit.
    PayloadTooLarge,
}

impl IgnoreReason {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EventNotHandled => "event_not_handled",
            Self::ActionNotHandled => "action_not_handled",
            Self::MalformedPayload => "malformed_payload",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

/// Classified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Event header value.
    pub event_type: Option<String>,
    /// Payload action.
    pub action: Option<String>,
    /// Repository identifier named by the payload.
    pub repository: Option<u64>,
    /// Pull request number named by the payload.
    pub pull_number: Option<u64>,
    /// Review decision.
    pub outcome: Result<ReviewTarget, IgnoreReason>,
}

impl Delivery {
    /// Builds an ignored delivery that carries only the event header.
    #[must_use]
    pub fn ignored(event_type: Option<&str>, reason: IgnoreReason) -> Self {
        Self {
            event_type: event_type.map(str::to_string),
            action: None,
            repository: None,
            pull_number: None,
            outcome: Err(reason),
        }
    }
}

/// Pull request payload subset.
#[derive(Deserialize)]
struct PullRequestPayload {
    /// Action that triggered the delivery.
    #[serde(default)]
    action: Option<String>,
    /// Top-level pull request number.
    #[serde(default)]
    number: Option<u64>,
    /// Repository the pull request targets.
    #[serde(default)]
    repository: Option<RepositoryPayload>,
    /// Pull request object.
    #[serde(default)]
    pull_request: Option<PullRequestObject>,
}

/// Repository payload subset.
#[derive(Deserialize)]
struct RepositoryPayload {
    /// Numeric repository identifier.
    id: u64,
}

/// Pull request object subset.
#[derive(Deserialize)]
struct PullRequestObject {
    /// Pull request number.
    number: u64,
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a delivery from its event header and body.
#[must_use]
pub fn classify(event_type: Option<&str>, body: &[u8]) -> Delivery {
    if event_type != Some(PULL_REQUEST_EVENT) {
        return Delivery::ignored(event_type, IgnoreReason::EventNotHandled);
    }
    let Ok(payload) = serde_json::from_slice::<PullRequestPayload>(body) else {
        return Delivery::ignored(event_type, IgnoreReason::MalformedPayload);
    };
    let repository = payload.repository.map(|repo| repo.id);
    let pull_number = payload.number.or_else(|| payload.pull_request.map(|pull| pull.number));
    let outcome = match (payload.action.as_deref(), repository, pull_number) {
        (Some(action), _, _) if !REVIEW_ACTIONS.contains(&action) => {
            Err(IgnoreReason::ActionNotHandled)
        }
        (None, _, _) => Err(IgnoreReason::ActionNotHandled),
        (Some(_), Some(repo), Some(number)) => Ok(ReviewTarget {
            repo: RepositoryId(repo),
            number,
        }),
        _ => Err(IgnoreReason::MalformedPayload),
    };
    Delivery {
        event_type: event_type.map(str::to_string),
        action: payload.action,
        repository,
        pull_number,
        outcome,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
