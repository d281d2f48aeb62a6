// crates/review-gate-providers/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Local HTTP server fixture for provider tests.
// Purpose: Serve scripted responses and record the requests received.
// Dependencies: tiny_http
// ============================================================================

//! ## Overview
//! [`MockServer`] runs a `tiny_http` server on an ephemeral loopback port and
//! answers each request through a handler closure.

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
#![allow(dead_code, reason = "Each test binary uses a subset of the shared helpers.")]

use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Replies
// ============================================================================

/// Scripted response.
pub struct Reply {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
    /// Extra response headers.
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    /// 200 with a raw body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// 200 with a JSON body.
    pub fn json(value: &serde_json::Value) -> Self {
        Self {
            status: 200,
            body: serde_json::to_vec(value).unwrap(),
            headers: vec![("Content-Type", "application/json".to_string())],
        }
    }

    /// Empty response with a status code.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// 302 pointing at `location`.
    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            body: Vec::new(),
            headers: vec![("Location", location.to_string())],
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Request observed by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// HTTP method.
    pub method: String,
    /// Path and query.
    pub url: String,
    /// Request body.
    pub body: String,
    /// `Authorization` header value.
    pub authorization: Option<String>,
}

/// Loopback HTTP server answering through a handler.
pub struct MockServer {
    /// Base URL (`http://127.0.0.1:PORT`).
    pub base: String,
    /// Underlying server.
    server: Arc<Server>,
    /// Requests seen so far.
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// Serving thread.
    handle: Option<thread::JoinHandle<()>>,
}

impl MockServer {
    /// Starts serving with `handler(method, url)`.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let serving = Arc::clone(&server);
        let log = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for mut request in serving.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Authorization"))
                    .map(|header| header.value.as_str().to_string());
                let method = request.method().to_string();
                let url = request.url().to_string();
                let reply = handler(&method, &url);
                log.lock().unwrap().push(Recorded {
                    method,
                    url,
                    body,
                    authorization,
                });
                let mut response = Response::from_data(reply.body).with_status_code(reply.status);
                for (name, value) in reply.headers {
                    let header = Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap();
                    response.add_header(header);
                }
                let _ = request.respond(response);
            }
        });
        Self {
            base: format!("http://{addr}"),
            server,
            requests,
            handle: Some(handle),
        }
    }

    /// Returns a URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
