// crates/review-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Review Gate Interfaces
// Description: Backend-agnostic interfaces for remote content and the host.
// Purpose: Define the contract surfaces the review pipeline depends on.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces keep the validation pipeline free of transport details. A
//! [`Fetcher`] streams remote content by URL; a [`HostClient`] wraps the
//! source-control host's pull request, commit, comment, and merge API.
//! Implementations must fail closed on invalid input.
//!
//! Security posture: URLs handed to a [`Fetcher`] are contributor-controlled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::sync::Arc;

use thiserror::Error;

use crate::core::Changeset;
use crate::core::RepositoryId;

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Streaming response body returned by a [`Fetcher`].
pub struct FetchStream {
    /// Response body reader.
    pub reader: Box<dyn Read + Send>,
    /// Declared body length when the server sent one.
    pub content_length: Option<u64>,
}

impl FetchStream {
    /// Wraps a reader with an optional declared length.
    #[must_use]
    pub fn new(reader: Box<dyn Read + Send>, content_length: Option<u64>) -> Self {
        Self {
            reader,
            content_length,
        }
    }
}

/// Remote fetch errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL failed to parse or uses an unsupported scheme.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Request was blocked by host or network policy.
    #[error("fetch blocked by policy: {0}")]
    Policy(String),
    /// Transport failure or non-success status.
    #[error("http failure: {0}")]
    Http(String),
    /// Reading the response body failed.
    #[error("io failure: {0}")]
    Io(String),
    /// Response exceeded the caller's byte limit.
    #[error("response exceeds size limit of {max_bytes} bytes")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: u64,
    },
}

/// Opens remote content for streaming.
pub trait Fetcher: Send + Sync {
    /// Opens the URL and returns its body as a stream.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the URL is invalid, blocked, or unreachable.
    fn open(&self, url: &str) -> Result<FetchStream, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn open(&self, url: &str) -> Result<FetchStream, FetchError> {
        (**self).open(url)
    }
}

impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    fn open(&self, url: &str) -> Result<FetchStream, FetchError> {
        (**self).open(url)
    }
}

/// Fetches a URL fully into memory, failing when it exceeds `max_bytes`.
///
/// # Errors
///
/// Returns [`FetchError`] when the fetch fails or the body is too large.
pub fn fetch_limited(
    fetcher: &dyn Fetcher,
    url: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, FetchError> {
    let stream = fetcher.open(url)?;
    if let Some(length) = stream.content_length
        && length > max_bytes
    {
        return Err(FetchError::TooLarge {
            max_bytes,
        });
    }
    let mut bytes = Vec::new();
    let mut limited = stream.reader.take(max_bytes.saturating_add(1));
    limited.read_to_end(&mut bytes).map_err(|err| FetchError::Io(err.to_string()))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > max_bytes {
        return Err(FetchError::TooLarge {
            max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Host Client
// ============================================================================

/// Pull request state relevant to the review state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestState {
    /// Pull request number.
    pub number: u64,
    /// Whether the pull request is already merged.
    pub merged: bool,
    /// Host-reported mergeability (`None` while the host is still computing).
    pub mergeable: Option<bool>,
    /// Number of commits in the pull request.
    pub commit_count: u64,
}

/// Host API errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HostError {
    /// Host could not be reached or returned a failure status.
    #[error("host request failed: {0}")]
    Request(String),
    /// Host response could not be decoded.
    #[error("host response invalid: {0}")]
    Decode(String),
    /// Requested resource does not exist.
    #[error("host resource not found: {0}")]
    NotFound(String),
}

/// Source-control host operations consumed by the review orchestrator.
pub trait HostClient: Send + Sync {
    /// Fetches a repository file's contents at the default branch.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the file cannot be fetched.
    fn file_contents(&self, repo: RepositoryId, path: &str) -> Result<Vec<u8>, HostError>;

    /// Fetches the current state of a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the pull request cannot be fetched.
    fn pull_request(&self, repo: RepositoryId, number: u64)
    -> Result<PullRequestState, HostError>;

    /// Lists commit identifiers of a pull request in order.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the commits cannot be listed.
    fn pull_commits(&self, repo: RepositoryId, number: u64) -> Result<Vec<String>, HostError>;

    /// Fetches the files and committer identity of a commit.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the commit cannot be fetched.
    fn commit_changeset(&self, repo: RepositoryId, commit_id: &str)
    -> Result<Changeset, HostError>;

    /// Posts a comment on the pull request conversation.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the comment cannot be posted.
    fn post_comment(&self, repo: RepositoryId, number: u64, body: &str) -> Result<(), HostError>;

    /// Merges the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the merge request fails.
    fn merge(&self, repo: RepositoryId, number: u64) -> Result<(), HostError>;
}

/// Forwards every host call through a shared reference.
macro_rules! forward_host_client {
    ($target:ty) => {
        impl<T: HostClient + ?Sized> HostClient for $target {
            fn file_contents(&self, repo: RepositoryId, path: &str) -> Result<Vec<u8>, HostError> {
                (**self).file_contents(repo, path)
            }

            fn pull_request(
                &self,
                repo: RepositoryId,
                number: u64,
            ) -> Result<PullRequestState, HostError> {
                (**self).pull_request(repo, number)
            }

            fn pull_commits(
                &self,
                repo: RepositoryId,
                number: u64,
            ) -> Result<Vec<String>, HostError> {
                (**self).pull_commits(repo, number)
            }

            fn commit_changeset(
                &self,
                repo: RepositoryId,
                commit_id: &str,
            ) -> Result<Changeset, HostError> {
                (**self).commit_changeset(repo, commit_id)
            }

            fn post_comment(
                &self,
                repo: RepositoryId,
                number: u64,
                body: &str,
            ) -> Result<(), HostError> {
                (**self).post_comment(repo, number, body)
            }

            fn merge(&self, repo: RepositoryId, number: u64) -> Result<(), HostError> {
                (**self).merge(repo, number)
            }
        }
    };
}

forward_host_client!(&T);
forward_host_client!(Arc<T>);
