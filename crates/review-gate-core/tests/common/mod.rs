// crates/review-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: In-memory fakes and fixture builders for review-gate-core tests.
// Purpose: Exercise validation and orchestration without network access.
// Dependencies: review-gate-core, zip, md-5, hex, image
// ============================================================================

//! ## Overview
//! Provides a map-backed [`Fetcher`], a scripted [`HostClient`] that records
//! comments and merges, and builders for archives, manifests, and images.

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

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::io::Cursor;
use std::io::Write;
use std::sync::Mutex;

use image::DynamicImage;
use image::ImageFormat;
use image::RgbImage;
use md5::Digest;
use md5::Md5;
use review_gate_core::ChangeKind;
use review_gate_core::ChangedFile;
use review_gate_core::Changeset;
use review_gate_core::FetchError;
use review_gate_core::FetchStream;
use review_gate_core::Fetcher;
use review_gate_core::HostClient;
use review_gate_core::HostError;
use review_gate_core::Identity;
use review_gate_core::PullRequestState;
use review_gate_core::RepositoryId;
use review_gate_core::validation::PNG_SIGNATURE;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// ============================================================================
// SECTION: Fetcher Fake
// ============================================================================

/// Fetcher serving fixed bodies by URL; unknown URLs fail.
#[derive(Default)]
pub struct MapFetcher {
    /// Bodies keyed by URL.
    bodies: BTreeMap<String, Vec<u8>>,
    /// URLs opened, in order.
    opened: Mutex<Vec<String>>,
}

impl MapFetcher {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a body for a URL.
    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    /// Returns how many times `url` was opened.
    pub fn open_count(&self, url: &str) -> usize {
        self.opened.lock().unwrap().iter().filter(|opened| *opened == url).count()
    }
}

impl Fetcher for MapFetcher {
    fn open(&self, url: &str) -> Result<FetchStream, FetchError> {
        self.opened.lock().unwrap().push(url.to_string());
        let body = self
            .bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Http(format!("404 for {url}")))?;
        let length = body.len() as u64;
        Ok(FetchStream::new(Box::new(Cursor::new(body)), Some(length)))
    }
}

// ============================================================================
// SECTION: Host Fake
// ============================================================================

/// Scripted host client recording comments and merges.
pub struct ScriptedHost {
    /// Access policy document text.
    pub policy: String,
    /// Pull request state returned for every lookup.
    pub pull: PullRequestState,
    /// Commit lists returned in order; the last one repeats.
    pub commit_lists: Mutex<VecDeque<Vec<String>>>,
    /// Changesets by commit identifier.
    pub changesets: BTreeMap<String, Changeset>,
    /// Posted comments.
    pub comments: Mutex<Vec<String>>,
    /// Number of merge requests.
    pub merges: Mutex<u32>,
}

impl ScriptedHost {
    /// Creates a host with one mergeable single-commit pull request.
    pub fn single_commit(policy: &str, changeset: Changeset) -> Self {
        let commit_id = changeset.commit_id.clone();
        Self {
            policy: policy.to_string(),
            pull: PullRequestState {
                number: 7,
                merged: false,
                mergeable: Some(true),
                commit_count: 1,
            },
            commit_lists: Mutex::new(VecDeque::from([vec![commit_id.clone()]])),
            changesets: BTreeMap::from([(commit_id, changeset)]),
            comments: Mutex::new(Vec::new()),
            merges: Mutex::new(0),
        }
    }

    /// Returns the posted comments.
    pub fn comments(&self) -> Vec<String> {
        self.comments.lock().unwrap().clone()
    }

    /// Returns the number of merge requests.
    pub fn merge_count(&self) -> u32 {
        *self.merges.lock().unwrap()
    }
}

impl HostClient for ScriptedHost {
    fn file_contents(&self, _repo: RepositoryId, path: &str) -> Result<Vec<u8>, HostError> {
        if path == "permissions.yml" {
            Ok(self.policy.clone().into_bytes())
        } else {
            Err(HostError::NotFound(path.to_string()))
        }
    }

    fn pull_request(
        &self,
        _repo: RepositoryId,
        _number: u64,
    ) -> Result<PullRequestState, HostError> {
        Ok(self.pull.clone())
    }

    fn pull_commits(&self, _repo: RepositoryId, _number: u64) -> Result<Vec<String>, HostError> {
        let mut lists = self.commit_lists.lock().unwrap();
        if lists.len() > 1 {
            Ok(lists.pop_front().unwrap())
        } else {
            Ok(lists.front().cloned().unwrap_or_default())
        }
    }

    fn commit_changeset(
        &self,
        _repo: RepositoryId,
        commit_id: &str,
    ) -> Result<Changeset, HostError> {
        self.changesets
            .get(commit_id)
            .cloned()
            .ok_or_else(|| HostError::NotFound(commit_id.to_string()))
    }

    fn post_comment(&self, _repo: RepositoryId, _number: u64, body: &str) -> Result<(), HostError> {
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }

    fn merge(&self, _repo: RepositoryId, _number: u64) -> Result<(), HostError> {
        *self.merges.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// SECTION: Fixture Builders
// ============================================================================

/// Builds an untrusted identity.
pub fn contributor(login: &str) -> Identity {
    Identity::new(login, format!("https://github.com/{login}"))
}

/// Builds a changed file with predictable URLs.
pub fn changed_file(path: &str) -> ChangedFile {
    ChangedFile {
        path: path.to_string(),
        raw_url: format!("https://raw.example/{path}"),
        blob_url: format!("https://blob.example/{path}"),
        change: ChangeKind::Modified,
    }
}

/// Builds a zip archive with the given members; names ending in `/` are directories.
pub fn zip_bytes(members: &[&str]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for member in members {
        if member.ends_with('/') {
            writer.add_directory(*member, options).unwrap();
        } else {
            writer.start_file(*member, options).unwrap();
            writer.write_all(b"payload").unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Returns the lowercase hex MD5 of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Renders a manifest for a payload URL and its bytes.
pub fn manifest_for(file_url: &str, payload: &[u8]) -> String {
    format!(
        "title: App One\nauthor: someone\nversion: 1.0\ndescription: Test app\nfile: \
         {file_url}\nfilesize: {}\nfile-md5: {}\n",
        payload.len(),
        md5_hex(payload)
    )
}

/// Builds PNG header bytes declaring the given dimensions.
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend(13_u32.to_be_bytes());
    bytes.extend(b"IHDR");
    bytes.extend(width.to_be_bytes());
    bytes.extend(height.to_be_bytes());
    bytes.extend([8, 6, 0, 0, 0]);
    bytes.extend([0, 0, 0, 0]);
    bytes
}

/// Encodes a blank image of the given size and format.
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}
