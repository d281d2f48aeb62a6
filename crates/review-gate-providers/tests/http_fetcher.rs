// crates/review-gate-providers/tests/http_fetcher.rs
// ============================================================================
// Module: HTTP Fetcher Tests
// Description: Scheme, address, redirect, and status handling.
// Purpose: Ensure contributor URLs are fetched only under policy.
// Dependencies: review-gate-providers, tiny_http
// ============================================================================

//! ## Overview
//! Exercises [`HttpFetcher`] against a loopback server:
//! - Streaming bodies with declared length
//! - Redirects followed and re-checked per hop, with a hop limit
//! - Private-address, cleartext, and credential rejection before any request

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::io::Read;
use std::time::Duration;

use review_gate_core::FetchError;
use review_gate_core::Fetcher;
use review_gate_core::fetch_limited;
use review_gate_providers::HttpFetcher;
use review_gate_providers::HttpFetcherConfig;

use crate::common::MockServer;
use crate::common::Reply;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Fetcher allowed to reach the loopback test server.
fn local_fetcher(max_redirects: u32) -> HttpFetcher {
    HttpFetcher::new(HttpFetcherConfig {
        allow_http: true,
        allow_private_networks: true,
        timeout: Duration::from_secs(5),
        max_redirects,
        ..HttpFetcherConfig::default()
    })
    .unwrap()
}

// ============================================================================
// SECTION: Bodies
// ============================================================================

#[test]
fn body_is_streamed_with_declared_length() {
    let server = MockServer::start(|_, _| Reply::ok("hello"));
    let mut stream = local_fetcher(0).open(&server.url("/file.zip")).unwrap();
    assert_eq!(stream.content_length, Some(5));
    let mut body = String::new();
    stream.reader.read_to_string(&mut body).unwrap();
    assert_eq!(body, "hello");
}

#[test]
fn byte_cap_applies_to_fetched_body() {
    let server = MockServer::start(|_, _| Reply::ok(vec![b'x'; 2048]));
    let fetcher = local_fetcher(0);
    let err = fetch_limited(&fetcher, &server.url("/icon.png"), 1024).unwrap_err();
    assert!(matches!(err, FetchError::TooLarge { max_bytes: 1024 }));
}

#[test]
fn error_status_fails_closed() {
    let server = MockServer::start(|_, _| Reply::status(404));
    let err = local_fetcher(0).open(&server.url("/missing")).err().unwrap();
    match err {
        FetchError::Http(message) => assert!(message.contains("404"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// SECTION: Redirects
// ============================================================================

#[test]
fn redirects_are_followed_within_limit() {
    let server = MockServer::start(|_, url| {
        if url == "/start" { Reply::redirect("/final") } else { Reply::ok("done") }
    });
    let mut stream = local_fetcher(1).open(&server.url("/start")).unwrap();
    let mut body = String::new();
    stream.reader.read_to_string(&mut body).unwrap();
    assert_eq!(body, "done");
    let urls: Vec<String> = server.requests().into_iter().map(|request| request.url).collect();
    assert_eq!(urls, vec!["/start".to_string(), "/final".to_string()]);
}

#[test]
fn redirect_chains_beyond_limit_are_rejected() {
    let server = MockServer::start(|_, _| Reply::redirect("/again"));
    let err = local_fetcher(2).open(&server.url("/start")).err().unwrap();
    assert!(matches!(
        err,
        FetchError::Policy(ref message) if message.contains("too many redirects")
    ));
    assert_eq!(server.requests().len(), 3);
}

#[test]
fn redirect_to_unsupported_scheme_is_rejected() {
    let server = MockServer::start(|_, _| Reply::redirect("ftp://files.example/app.zip"));
    let err = local_fetcher(3).open(&server.url("/start")).err().unwrap();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

// ============================================================================
// SECTION: Policy
// ============================================================================

#[test]
fn loopback_targets_are_denied_by_default() {
    let server = MockServer::start(|_, _| Reply::ok("secret"));
    let fetcher = HttpFetcher::new(HttpFetcherConfig {
        allow_http: true,
        ..HttpFetcherConfig::default()
    })
    .unwrap();
    let err = fetcher.open(&server.url("/")).err().unwrap();
    assert!(matches!(err, FetchError::Policy(_)));
    assert!(server.requests().is_empty());
}

#[test]
fn cleartext_http_is_denied_by_default() {
    let server = MockServer::start(|_, _| Reply::ok("x"));
    let fetcher = HttpFetcher::new(HttpFetcherConfig {
        allow_private_networks: true,
        ..HttpFetcherConfig::default()
    })
    .unwrap();
    let err = fetcher.open(&server.url("/")).err().unwrap();
    assert!(matches!(err, FetchError::Policy(ref message) if message.contains("cleartext")));
    assert!(server.requests().is_empty());
}

#[test]
fn embedded_credentials_are_rejected() {
    let server = MockServer::start(|_, _| Reply::ok("x"));
    let url = server.base.replace("http://", "http://user:pw@");
    let err = local_fetcher(0).open(&url).err().unwrap();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

#[test]
fn unparsable_urls_are_invalid() {
    let err = local_fetcher(0).open("not a url").err().unwrap();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}
