// crates/review-gate-server/src/server.rs
// ============================================================================
// Module: Review Server
// Description: HTTP webhook listener that schedules pull request reviews.
// Purpose: Acknowledge every delivery and run reviews off the request path.
// Dependencies: review-gate-core, review-gate-config, axum, tokio
// ============================================================================

//! ## Overview
//! The review server accepts host webhook deliveries on a single POST route.
//! Every delivery receives `200 {"success": true}` regardless of outcome;
//! review results reach contributors only through comments and merges.
//! Qualifying deliveries are handed to the blocking thread pool, where the
//! [`ReviewRunner`] drives one review to a verdict. Reviews of one pull
//! request never overlap: a delivery for a change already under review is
//! folded into a single follow-up pass. Security posture: the body is
//! untrusted and bounded by `server.max_body_bytes`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use review_gate_config::ReviewGateConfig;
use review_gate_config::ServerConfig;
use review_gate_core::Fetcher;
use review_gate_core::HostClient;
use review_gate_core::RepositoryId;
use review_gate_core::ReviewError;
use review_gate_core::ReviewOrchestrator;
use review_gate_core::ReviewReport;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::ReviewAuditSink;
use crate::audit::ReviewCompletedEvent;
use crate::audit::ReviewFailedEvent;
use crate::audit::WebhookAuditEvent;
use crate::bootstrap::build_audit_sink;
use crate::bootstrap::build_fetcher;
use crate::bootstrap::build_host_client;
use crate::webhook::Delivery;
use crate::webhook::EVENT_HEADER;
use crate::webhook::IgnoreReason;
use crate::webhook::ReviewTarget;
use crate::webhook::classify;

// ============================================================================
// SECTION: Review Runner
// ============================================================================

/// Runs one pull request review to a verdict.
pub trait ReviewRunner: Send + Sync {
    /// Reviews the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError`] on administrative failure.
    fn review(&self, repo: RepositoryId, number: u64) -> Result<ReviewReport, ReviewError>;
}

impl<H, F> ReviewRunner for ReviewOrchestrator<H, F>
where
    H: HostClient,
    F: Fetcher,
{
    fn review(&self, repo: RepositoryId, number: u64) -> Result<ReviewReport, ReviewError> {
        Self::review(self, repo, number)
    }
}

/// Runs a review and records its outcome.
pub fn run_review(runner: &dyn ReviewRunner, audit: &dyn ReviewAuditSink, target: ReviewTarget) {
    match runner.review(target.repo, target.number) {
        Ok(report) => audit.record_completed(&ReviewCompletedEvent::from_report(
            target.repo,
            target.number,
            &report,
        )),
        Err(err) => {
            audit.record_failed(&ReviewFailedEvent::from_error(target.repo, target.number, &err));
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Webhook review server.
pub struct ReviewServer {
    /// Socket address to bind.
    bind: SocketAddr,
    /// Route receiving deliveries.
    webhook_path: String,
    /// Shared handler state.
    state: Arc<ServerState>,
}

/// Shared state for webhook handlers.
struct ServerState {
    /// Review runner invoked on the blocking pool.
    runner: Arc<dyn ReviewRunner>,
    /// Audit sink for deliveries and outcomes.
    audit: Arc<dyn ReviewAuditSink>,
    /// Maximum accepted body size.
    max_body_bytes: usize,
    /// Pull requests with a review in progress.
    queue: ReviewQueue,
}

impl ReviewServer {
    /// Builds a server from listener settings, a runner, and an audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the bind address is invalid.
    pub fn new(
        config: &ServerConfig,
        runner: Arc<dyn ReviewRunner>,
        audit: Arc<dyn ReviewAuditSink>,
    ) -> Result<Self, ServerError> {
        let bind = config.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self {
            bind,
            webhook_path: config.webhook_path.clone(),
            state: Arc::new(ServerState {
                runner,
                audit,
                max_body_bytes: config.max_body_bytes,
                queue: ReviewQueue::default(),
            }),
        })
    }

    /// Builds a server and its providers from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or a provider
    /// cannot be initialized.
    pub fn from_config(config: &ReviewGateConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let host = build_host_client(&config.host)?;
        let fetcher = build_fetcher(&config.fetch)?;
        let audit = build_audit_sink(&config.audit)?;
        let runner = ReviewOrchestrator::new(host, fetcher, config.review_settings());
        Self::new(&config.server, Arc::new(runner), audit)
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Builds the webhook router.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.webhook_path, post(handle_webhook))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {} failed: {err}", self.bind)))?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_on<S>(self, listener: TcpListener, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Resolves when the process receives an interrupt.
async fn shutdown_signal() {
    wait_for_interrupt(tokio::signal::ctrl_c()).await;
}

/// Awaits `signal`, never resolving when the handler failed to install.
async fn wait_for_interrupt<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    if signal.await.is_err() {
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// SECTION: Per-Change Serialization
// ============================================================================

/// Tracks pull requests with a review in progress.
///
/// Each entry records whether another delivery arrived while the review
/// was running, in which case the worker runs one more pass.
#[derive(Debug, Default)]
pub(crate) struct ReviewQueue {
    /// In-flight targets mapped to their pending-rerun flag.
    in_flight: Mutex<HashMap<ReviewTarget, bool>>,
}

impl ReviewQueue {
    /// Claims `target` for a new worker.
    ///
    /// Returns `false` when a worker already owns the target; the running
    /// worker is then told to review once more.
    pub(crate) fn claim(&self, target: ReviewTarget) -> bool {
        let mut in_flight = self.lock();
        if let Some(rerun) = in_flight.get_mut(&target) {
            *rerun = true;
            return false;
        }
        in_flight.insert(target, false);
        true
    }

    /// Ends one pass for `target`.
    ///
    /// Returns `true` when the worker must review again, otherwise
    /// releases the target.
    pub(crate) fn finish(&self, target: ReviewTarget) -> bool {
        let mut in_flight = self.lock();
        match in_flight.get_mut(&target) {
            Some(rerun) if *rerun => {
                *rerun = false;
                true
            }
            _ => {
                in_flight.remove(&target);
                false
            }
        }
    }

    /// Locks the in-flight map, recovering from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, HashMap<ReviewTarget, bool>> {
        self.in_flight.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles one webhook delivery.
async fn handle_webhook(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    let event_type = headers.get(EVENT_HEADER).and_then(|value| value.to_str().ok());
    let delivery = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => classify(event_type, &bytes),
        Err(_) => Delivery::ignored(event_type, IgnoreReason::PayloadTooLarge),
    };
    state.audit.record_webhook(&WebhookAuditEvent::from_delivery(&delivery));
    if let Ok(target) = delivery.outcome {
        schedule_review(&state, target);
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

/// Hands a review to the blocking pool unless one is already running.
fn schedule_review(state: &Arc<ServerState>, target: ReviewTarget) {
    if !state.queue.claim(target) {
        return;
    }
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        loop {
            run_review(state.runner.as_ref(), state.audit.as_ref(), target);
            if !state.queue.finish(target) {
                break;
            }
        }
    });
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Review server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
    /// Initialization failure.
    #[error("initialization error: {0}")]
    Init(String),
    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
