// crates/review-gate-providers/src/github.rs
// ============================================================================
// Module: GitHub Host Client
// Description: REST implementation of the core host interface.
// Purpose: Read pull requests, commits, and files; post comments; merge.
// Dependencies: review-gate-core, reqwest, serde, serde_json, base64, url
// ============================================================================

//! ## Overview
//! [`GitHubClient`] speaks the GitHub REST v3 API addressed by numeric
//! repository id (`/repositories/{id}/...`). Requests carry a bearer token
//! and are bounded by a timeout. Response bodies are capped before decoding.
//!
//! Trust: a committer is trusted only when a `trusted_org` is configured and
//! the committer's public organization list contains it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use review_gate_core::ChangeKind;
use review_gate_core::ChangedFile;
use review_gate_core::Changeset;
use review_gate_core::HostClient;
use review_gate_core::HostError;
use review_gate_core::Identity;
use review_gate_core::PullRequestState;
use review_gate_core::RepositoryId;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::ProviderError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum API response body accepted for decoding.
const MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;
/// Media type requested from the API.
const API_MEDIA_TYPE: &str = "application/vnd.github+json";
/// Page size used for list endpoints.
const PAGE_SIZE: &str = "100";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the GitHub client.
#[derive(Clone)]
pub struct GitHubConfig {
    /// REST API base URL.
    pub api_base: String,
    /// Bearer token.
    pub token: String,
    /// User agent (required by the API).
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Organization whose members are trusted.
    pub trusted_org: Option<String>,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Repository contents response.
#[derive(Deserialize)]
struct ContentsBody {
    /// Encoded file content.
    content: String,
    /// Content encoding (`base64`).
    encoding: String,
}

/// Pull request response subset.
#[derive(Deserialize)]
struct PullBody {
    /// Pull request number.
    number: u64,
    /// Whether it has been merged.
    #[serde(default)]
    merged: bool,
    /// Host-computed mergeability.
    #[serde(default)]
    mergeable: Option<bool>,
    /// Number of commits.
    #[serde(default)]
    commits: u64,
}

/// Commit list entry.
#[derive(Deserialize)]
struct CommitRef {
    /// Commit identifier.
    sha: String,
}

/// Linked account of a commit.
#[derive(Deserialize)]
struct AccountBody {
    /// Account login.
    login: String,
    /// Profile URL.
    html_url: String,
}

/// Changed file entry of a commit.
#[derive(Deserialize)]
struct CommitFileBody {
    /// Repository-relative path.
    filename: String,
    /// Change status label.
    #[serde(default)]
    status: String,
    /// Raw content URL.
    #[serde(default)]
    raw_url: String,
    /// Web view URL.
    #[serde(default)]
    blob_url: String,
}

/// Single commit response subset.
#[derive(Deserialize)]
struct CommitBody {
    /// Commit identifier.
    sha: String,
    /// Linked committer account.
    #[serde(default)]
    committer: Option<AccountBody>,
    /// Linked author account.
    #[serde(default)]
    author: Option<AccountBody>,
    /// Changed files.
    #[serde(default)]
    files: Vec<CommitFileBody>,
}

/// Organization list entry.
#[derive(Deserialize)]
struct OrgBody {
    /// Organization login.
    login: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// GitHub REST host client.
#[derive(Clone)]
pub struct GitHubClient {
    /// HTTP client with redirects disabled.
    client: Client,
    /// Parsed API base.
    api_base: Url,
    /// Bearer token.
    token: String,
    /// Organization whose members are trusted.
    trusted_org: Option<String>,
}

impl GitHubClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the base URL is unusable or the HTTP
    /// client cannot be constructed.
    pub fn new(config: GitHubConfig) -> Result<Self, ProviderError> {
        let api_base =
            Url::parse(&config.api_base).map_err(|err| ProviderError::Config(err.to_string()))?;
        if api_base.cannot_be_a_base() {
            return Err(ProviderError::Config("api base cannot carry a path".to_string()));
        }
        if config.token.trim().is_empty() {
            return Err(ProviderError::MissingToken);
        }
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|err| ProviderError::Client(err.to_string()))?;
        Ok(Self {
            client,
            api_base,
            token: config.token,
            trusted_org: config.trusted_org,
        })
    }

    /// Builds an endpoint URL from path segments below the API base.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Builds an endpoint under `/repositories/{id}`.
    fn repo_endpoint<'s>(
        &self,
        repo: RepositoryId,
        segments: impl IntoIterator<Item = &'s str>,
    ) -> Url {
        let id = repo.to_string();
        let mut url = self.endpoint(["repositories", id.as_str()]);
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// Starts an authenticated request.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, API_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Sends a request and returns the bounded response body.
    fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, HostError> {
        let response = request.send().map_err(|err| HostError::Request(err.to_string()))?;
        let status = response.status();
        let url = response.url().clone();
        if status == StatusCode::NOT_FOUND {
            return Err(HostError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            return Err(HostError::Request(format!("{} returned {status}", url.path())));
        }
        let mut body = Vec::new();
        response
            .take(MAX_RESPONSE_BYTES + 1)
            .read_to_end(&mut body)
            .map_err(|err| HostError::Request(err.to_string()))?;
        if u64::try_from(body.len()).unwrap_or(u64::MAX) > MAX_RESPONSE_BYTES {
            return Err(HostError::Decode("response exceeds size limit".to_string()));
        }
        Ok(body)
    }

    /// Sends a GET and decodes the JSON body.
    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, HostError> {
        let body = self.send(self.request(Method::GET, url))?;
        serde_json::from_slice(&body).map_err(|err| HostError::Decode(err.to_string()))
    }

    /// Sends a JSON body with the given method, discarding the response.
    fn send_json(
        &self,
        method: Method,
        url: Url,
        payload: &serde_json::Value,
    ) -> Result<(), HostError> {
        let body = serde_json::to_vec(payload).map_err(|err| HostError::Decode(err.to_string()))?;
        self.send(self.request(method, url).header(CONTENT_TYPE, "application/json").body(body))?;
        Ok(())
    }

    /// Returns whether `login` publicly belongs to the trusted organization.
    fn is_trusted(&self, login: &str) -> Result<bool, HostError> {
        let Some(org) = &self.trusted_org else {
            return Ok(false);
        };
        let mut url = self.endpoint(["users", login, "orgs"]);
        url.query_pairs_mut().append_pair("per_page", PAGE_SIZE);
        let orgs: Vec<OrgBody> = self.get_json(url)?;
        Ok(orgs.iter().any(|entry| entry.login.eq_ignore_ascii_case(org)))
    }
}

impl HostClient for GitHubClient {
    fn file_contents(&self, repo: RepositoryId, path: &str) -> Result<Vec<u8>, HostError> {
        let url = self.repo_endpoint(repo, std::iter::once("contents").chain(path.split('/')));
        let body: ContentsBody = self.get_json(url)?;
        if body.encoding != "base64" {
            return Err(HostError::Decode(format!(
                "unsupported content encoding {}",
                body.encoding
            )));
        }
        let compact: String = body.content.split_ascii_whitespace().collect();
        STANDARD.decode(compact).map_err(|err| HostError::Decode(err.to_string()))
    }

    fn pull_request(&self, repo: RepositoryId, number: u64) -> Result<PullRequestState, HostError> {
        let number_text = number.to_string();
        let body: PullBody =
            self.get_json(self.repo_endpoint(repo, ["pulls", number_text.as_str()]))?;
        Ok(PullRequestState {
            number: body.number,
            merged: body.merged,
            mergeable: body.mergeable,
            commit_count: body.commits,
        })
    }

    fn pull_commits(&self, repo: RepositoryId, number: u64) -> Result<Vec<String>, HostError> {
        let number_text = number.to_string();
        let mut url = self.repo_endpoint(repo, ["pulls", number_text.as_str(), "commits"]);
        url.query_pairs_mut().append_pair("per_page", PAGE_SIZE);
        let commits: Vec<CommitRef> = self.get_json(url)?;
        Ok(commits.into_iter().map(|commit| commit.sha).collect())
    }

    fn commit_changeset(
        &self,
        repo: RepositoryId,
        commit_id: &str,
    ) -> Result<Changeset, HostError> {
        let body: CommitBody = self.get_json(self.repo_endpoint(repo, ["commits", commit_id]))?;
        let account = body.committer.or(body.author).ok_or_else(|| {
            HostError::Decode(format!("commit {} has no linked account", body.sha))
        })?;
        let mut author = Identity::new(account.login, account.html_url);
        if self.is_trusted(&author.login)? {
            author = author.trusted();
        }
        let files = body
            .files
            .into_iter()
            .map(|file| ChangedFile {
                change: ChangeKind::from_status(&file.status),
                path: file.filename,
                raw_url: file.raw_url,
                blob_url: file.blob_url,
            })
            .collect();
        Ok(Changeset {
            commit_id: body.sha,
            author,
            files,
        })
    }

    fn post_comment(&self, repo: RepositoryId, number: u64, body: &str) -> Result<(), HostError> {
        let number_text = number.to_string();
        let url = self.repo_endpoint(repo, ["issues", number_text.as_str(), "comments"]);
        self.send_json(Method::POST, url, &json!({ "body": body }))
    }

    fn merge(&self, repo: RepositoryId, number: u64) -> Result<(), HostError> {
        let number_text = number.to_string();
        let url = self.repo_endpoint(repo, ["pulls", number_text.as_str(), "merge"]);
        self.send_json(Method::PUT, url, &json!({}))
    }
}
