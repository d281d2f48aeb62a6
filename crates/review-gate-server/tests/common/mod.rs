// crates/review-gate-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Support
// Description: Recording runner, recording audit sink, and server harness.
// Purpose: Observe scheduled reviews and audit records without a host.
// Dependencies: review-gate-server, review-gate-core, tokio
// ============================================================================

//! ## Overview
//! Shared helpers for webhook server tests.

#![allow(dead_code, reason = "Helpers are shared across test binaries.")]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use review_gate_config::ServerConfig;
use review_gate_core::HostError;
use review_gate_core::RepositoryId;
use review_gate_core::ReviewError;
use review_gate_core::ReviewReport;
use review_gate_core::Verdict;
use review_gate_server::ReviewAuditSink;
use review_gate_server::ReviewCompletedEvent;
use review_gate_server::ReviewFailedEvent;
use review_gate_server::ReviewRunner;
use review_gate_server::ReviewServer;
use review_gate_server::WebhookAuditEvent;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runner that reports each call on a channel.
pub struct RecordingRunner {
    /// Call notifications.
    calls: mpsc::UnboundedSender<(RepositoryId, u64)>,
    /// Whether reviews fail administratively.
    fail: bool,
}

impl RecordingRunner {
    /// Creates a runner and the receiver observing its calls.
    pub fn new(fail: bool) -> (Self, mpsc::UnboundedReceiver<(RepositoryId, u64)>) {
        let (calls, receiver) = mpsc::unbounded_channel();
        (
            Self {
                calls,
                fail,
            },
            receiver,
        )
    }
}

impl ReviewRunner for RecordingRunner {
    fn review(&self, repo: RepositoryId, number: u64) -> Result<ReviewReport, ReviewError> {
        let _ = self.calls.send((repo, number));
        if self.fail {
            return Err(ReviewError::Host(HostError::Request("host offline".to_string())));
        }
        Ok(ReviewReport {
            verdict: Verdict::Merged,
            attempts: 1,
            commit_id: Some("c1".to_string()),
            violations: Vec::new(),
        })
    }
}

/// Runner that holds each review open and tracks peak concurrency.
pub struct SlowRunner {
    /// Time each review takes.
    delay: Duration,
    /// Reviews currently running.
    running: AtomicUsize,
    /// Highest observed concurrency.
    peak: AtomicUsize,
    /// Reviews started.
    started: AtomicUsize,
}

impl SlowRunner {
    /// Creates a runner whose reviews take `delay`.
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        }
    }

    /// Returns the highest number of reviews that overlapped.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Returns the number of reviews started.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl ReviewRunner for SlowRunner {
    fn review(&self, _repo: RepositoryId, _number: u64) -> Result<ReviewReport, ReviewError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(ReviewReport {
            verdict: Verdict::Merged,
            attempts: 1,
            commit_id: Some("c1".to_string()),
            violations: Vec::new(),
        })
    }
}

/// Audit sink collecting serialized records.
#[derive(Default)]
pub struct RecordingAudit {
    /// Records in arrival order.
    records: Mutex<Vec<Value>>,
}

impl RecordingAudit {
    /// Returns a snapshot of recorded events.
    pub fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    /// Waits until a record with the given event name appears.
    pub async fn wait_for(&self, event: &str) -> Value {
        for _ in 0 .. 100 {
            if let Some(record) = self.records().into_iter().find(|record| record["event"] == event)
            {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no {event} record within timeout");
    }

    /// Returns how many records carry the given event name.
    pub fn count(&self, event: &str) -> usize {
        self.records().iter().filter(|record| record["event"] == event).count()
    }

    /// Stores one record.
    fn push<T: serde::Serialize>(&self, event: &T) {
        self.records.lock().unwrap().push(serde_json::to_value(event).unwrap());
    }
}

impl ReviewAuditSink for RecordingAudit {
    fn record_webhook(&self, event: &WebhookAuditEvent) {
        self.push(event);
    }

    fn record_completed(&self, event: &ReviewCompletedEvent) {
        self.push(event);
    }

    fn record_failed(&self, event: &ReviewFailedEvent) {
        self.push(event);
    }
}

/// Running server bound to an ephemeral port.
pub struct TestServer {
    /// Bound address.
    pub addr: SocketAddr,
    /// Serving task.
    task: JoinHandle<()>,
}

impl TestServer {
    /// Starts a server with the given limits, runner, and audit sink.
    pub async fn start(
        max_body_bytes: usize,
        runner: Arc<dyn ReviewRunner>,
        audit: Arc<dyn ReviewAuditSink>,
    ) -> Self {
        let config = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            max_body_bytes,
            webhook_path: "/hooks".to_string(),
        };
        let server = ReviewServer::new(&config, runner, audit).unwrap();
        let listener = TcpListener::bind(server.bind_addr()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            server.serve_on(listener, std::future::pending()).await.unwrap();
        });
        Self {
            addr,
            task,
        }
    }

    /// Returns the webhook URL.
    pub fn webhook_url(&self) -> String {
        format!("http://{}/hooks", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Builds a pull request payload for repository 42, pull request 7.
pub fn pull_request_payload(action: &str) -> String {
    format!(
        "{{\"action\":\"{action}\",\"number\":7,\"repository\":{{\"id\":42}},\
         \"pull_request\":{{\"number\":7}}}}"
    )
}
