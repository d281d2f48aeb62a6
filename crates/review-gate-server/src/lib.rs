// crates/review-gate-server/src/lib.rs
// ============================================================================
// Module: Review Gate Server
// Description: Webhook listener, delivery classification, and audit sinks.
// Purpose: Turn host webhook deliveries into scheduled pull request reviews.
// Dependencies: review-gate-core, review-gate-config, review-gate-providers, axum
// ============================================================================

//! ## Overview
//! This crate hosts the review pipeline behind an HTTP webhook. Deliveries
//! are classified, audited, and acknowledged immediately; qualifying pull
//! request events run a [`review_gate_core::ReviewOrchestrator`] on the
//! blocking pool.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod bootstrap;
pub mod server;
pub mod webhook;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ReviewAuditSink;
pub use audit::ReviewCompletedEvent;
pub use audit::ReviewFailedEvent;
pub use audit::StderrAuditSink;
pub use audit::WebhookAuditEvent;
pub use bootstrap::build_audit_sink;
pub use bootstrap::build_fetcher;
pub use bootstrap::build_host_client;
pub use bootstrap::host_client_with_token;
pub use server::ReviewRunner;
pub use server::ReviewServer;
pub use server::ServerError;
pub use server::run_review;
pub use webhook::Delivery;
pub use webhook::IgnoreReason;
pub use webhook::ReviewTarget;
pub use webhook::classify;
