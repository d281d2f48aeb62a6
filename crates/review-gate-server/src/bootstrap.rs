// crates/review-gate-server/src/bootstrap.rs
// ============================================================================
// Module: Provider Bootstrap
// Description: Builds providers and audit sinks from configuration.
// Purpose: Keep configuration-to-runtime wiring in one place.
// Dependencies: review-gate-config, review-gate-providers
// ============================================================================

//! ## Overview
//! Translates validated [`ReviewGateConfig`] sections into the concrete
//! fetcher, host client, and audit sink used by the server and CLI. The host
//! token is read from the environment variable named by `host.token_env` and
//! is never stored in configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use review_gate_config::AuditConfig;
use review_gate_config::FetchConfig;
use review_gate_config::HostConfig;
use review_gate_providers::GitHubClient;
use review_gate_providers::GitHubConfig;
use review_gate_providers::HttpFetcher;
use review_gate_providers::HttpFetcherConfig;

use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::ReviewAuditSink;
use crate::audit::StderrAuditSink;
use crate::server::ServerError;

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the remote content fetcher.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the HTTP client cannot be built.
pub fn build_fetcher(config: &FetchConfig) -> Result<HttpFetcher, ServerError> {
    HttpFetcher::new(HttpFetcherConfig {
        allow_http: config.allow_http,
        allow_private_networks: config.allow_private_networks,
        timeout: Duration::from_millis(config.timeout_ms),
        max_redirects: config.max_redirects,
        user_agent: config.user_agent.clone(),
    })
    .map_err(|err| ServerError::Init(err.to_string()))
}

/// Builds the host client, reading the token from the environment.
///
/// # Errors
///
/// Returns [`ServerError::Config`] when the token variable is unset and
/// [`ServerError::Init`] when the client cannot be built.
pub fn build_host_client(config: &HostConfig) -> Result<GitHubClient, ServerError> {
    let token = std::env::var(&config.token_env).map_err(|_| {
        ServerError::Config(format!("environment variable {} is not set", config.token_env))
    })?;
    host_client_with_token(config, token)
}

/// Builds the host client with an explicit token.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the client cannot be built.
pub fn host_client_with_token(
    config: &HostConfig,
    token: String,
) -> Result<GitHubClient, ServerError> {
    GitHubClient::new(GitHubConfig {
        api_base: config.api_base.clone(),
        token,
        user_agent: config.user_agent.clone(),
        timeout: Duration::from_millis(config.timeout_ms),
        trusted_org: config.trusted_org.clone(),
    })
    .map_err(|err| ServerError::Init(err.to_string()))
}

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the audit log cannot be opened.
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn ReviewAuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}
