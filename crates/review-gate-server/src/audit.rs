// crates/review-gate-server/src/audit.rs
// ============================================================================
// Module: Review Audit Logging
// Description: Structured audit events for webhook deliveries and reviews.
// Purpose: Emit JSON-lines audit records without a logging framework.
// Dependencies: review-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for the review server.
//! Every event is serialized as one JSON object per line so deployments can
//! route records to their preferred pipeline. Sinks never fail the caller:
//! serialization or write errors drop the record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use review_gate_core::RepositoryId;
use review_gate_core::ReviewError;
use review_gate_core::ReviewReport;
use serde::Serialize;

use crate::webhook::Delivery;
use crate::webhook::IgnoreReason;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit record for one webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Value of the host event header, when present.
    pub event_type: Option<String>,
    /// Payload action, when present.
    pub action: Option<String>,
    /// Repository identifier, when the payload named one.
    pub repository: Option<u64>,
    /// Pull request number, when the payload named one.
    pub pull_number: Option<u64>,
    /// Whether a review was scheduled.
    pub scheduled: bool,
    /// Why no review was scheduled.
    pub ignored_reason: Option<&'static str>,
}

impl WebhookAuditEvent {
    /// Builds a delivery record from a classified delivery.
    #[must_use]
    pub fn from_delivery(delivery: &Delivery) -> Self {
        Self {
            event: "webhook_received",
            timestamp_ms: now_millis(),
            event_type: delivery.event_type.clone(),
            action: delivery.action.clone(),
            repository: delivery.repository,
            pull_number: delivery.pull_number,
            scheduled: delivery.outcome.is_ok(),
            ignored_reason: delivery.outcome.err().map(IgnoreReason::label),
        }
    }
}

/// Audit record for a review that reached a verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewCompletedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Repository identifier.
    pub repository: u64,
    /// Pull request number.
    pub pull_number: u64,
    /// Stable verdict label.
    pub verdict: &'static str,
    /// Review passes started.
    pub attempts: u32,
    /// Number of violations reported.
    pub violation_count: usize,
    /// Commit the verdict applies to.
    pub commit_id: Option<String>,
}

impl ReviewCompletedEvent {
    /// Builds a completion record from a review report.
    #[must_use]
    pub fn from_report(repo: RepositoryId, pull_number: u64, report: &ReviewReport) -> Self {
        Self {
            event: "review_completed",
            timestamp_ms: now_millis(),
            repository: repo.0,
            pull_number,
            verdict: report.verdict.label(),
            attempts: report.attempts,
            violation_count: report.violations.len(),
            commit_id: report.commit_id.clone(),
        }
    }
}

/// Audit record for a review aborted by an administrative failure.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewFailedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Repository identifier.
    pub repository: u64,
    /// Pull request number.
    pub pull_number: u64,
    /// Error description.
    pub error: String,
}

impl ReviewFailedEvent {
    /// Builds a failure record from a review error.
    #[must_use]
    pub fn from_error(repo: RepositoryId, pull_number: u64, error: &ReviewError) -> Self {
        Self {
            event: "review_failed",
            timestamp_ms: now_millis(),
            repository: repo.0,
            pull_number,
            error: error.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for review server events.
pub trait ReviewAuditSink: Send + Sync {
    /// Records a webhook delivery.
    fn record_webhook(&self, event: &WebhookAuditEvent);

    /// Records a completed review.
    fn record_completed(&self, event: &ReviewCompletedEvent);

    /// Records a failed review.
    fn record_failed(&self, event: &ReviewFailedEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ReviewAuditSink for StderrAuditSink {
    fn record_webhook(&self, event: &WebhookAuditEvent) {
        write_line(&mut io::stderr(), event);
    }

    fn record_completed(&self, event: &ReviewCompletedEvent) {
        write_line(&mut io::stderr(), event);
    }

    fn record_failed(&self, event: &ReviewFailedEvent) {
        write_line(&mut io::stderr(), event);
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Append-mode audit log.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized record under the file lock.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(mut file) = self.file.lock() {
            write_line(&mut *file, event);
        }
    }
}

impl ReviewAuditSink for FileAuditSink {
    fn record_webhook(&self, event: &WebhookAuditEvent) {
        self.append(event);
    }

    fn record_completed(&self, event: &ReviewCompletedEvent) {
        self.append(event);
    }

    fn record_failed(&self, event: &ReviewFailedEvent) {
        self.append(event);
    }
}

/// No-op audit sink for disabled logging.
pub struct NoopAuditSink;

impl ReviewAuditSink for NoopAuditSink {
    fn record_webhook(&self, _event: &WebhookAuditEvent) {}

    fn record_completed(&self, _event: &ReviewCompletedEvent) {}

    fn record_failed(&self, _event: &ReviewFailedEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serializes `event` as one line and flushes the writer.
fn write_line<W: Write + ?Sized, T: Serialize>(writer: &mut W, event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
        let _ = writer.flush();
    }
}

/// Returns the current timestamp in milliseconds.
pub(crate) fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |duration| duration.as_millis())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
