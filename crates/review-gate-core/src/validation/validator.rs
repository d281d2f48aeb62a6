// crates/review-gate-core/src/validation/validator.rs
// ============================================================================
// Module: Manifest Validator
// Description: Field checks, screenshot checks, and payload integrity checks.
// Purpose: Produce the complete violation list for one package manifest.
// Dependencies: crate::{core, interfaces, validation}, url
// ============================================================================

//! ## Overview
//! Validation runs in three steps. Schema findings (missing, unknown, and
//! malformed fields) and per-field checks always run in full so a contributor
//! sees every problem at once. The payload integrity step downloads the
//! declared archive, verifies checksum and size, and inspects member paths;
//! it only runs when the first two steps found nothing.
//!
//! Security posture: every URL is contributor-controlled. Downloads go through
//! the [`Fetcher`] with byte caps and are spooled to scoped temporary files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::thread;

use url::Url;

use crate::core::Violation;
use crate::interfaces::Fetcher;
use crate::interfaces::fetch_limited;
use crate::validation::archive::ArchiveInspector;
use crate::validation::archive::SUPPORTED_TYPES;
use crate::validation::download::spool_download;
use crate::validation::images::check_screenshot;
use crate::validation::manifest::FieldValue;
use crate::validation::manifest::Manifest;
use crate::validation::manifest::ManifestEntry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bytes per MiB, used when rendering limits.
const MIB: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Numeric and layout limits applied during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Maximum `title` length in characters.
    pub max_title_chars: usize,
    /// Maximum declared and downloaded payload size.
    pub max_file_bytes: u64,
    /// Maximum number of screenshots.
    pub max_screenshots: usize,
    /// Required screenshot width.
    pub screenshot_width: u32,
    /// Required screenshot height.
    pub screenshot_height: u32,
    /// Required icon width.
    pub icon_width: u32,
    /// Required icon height.
    pub icon_height: u32,
    /// Allowed screenshot hosts (`host` or `*.suffix`).
    pub screenshot_hosts: Vec<String>,
    /// Maximum screenshot download size.
    pub max_screenshot_bytes: u64,
    /// Maximum icon download size.
    pub max_icon_bytes: u64,
    /// Maximum manifest download size.
    pub max_manifest_bytes: u64,
    /// Install root directory inside archives.
    pub archive_root: String,
    /// Required payload extension.
    pub payload_extension: String,
    /// Whether archive members must sit directly in the package directory.
    pub strict_archive_prefix: bool,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_title_chars: 25,
            max_file_bytes: 100 * MIB,
            max_screenshots: 5,
            screenshot_width: 400,
            screenshot_height: 480,
            icon_width: 48,
            icon_height: 48,
            screenshot_hosts: vec!["i.imgur.com".to_string()],
            max_screenshot_bytes: 8 * MIB,
            max_icon_bytes: MIB,
            max_manifest_bytes: 64 * 1024,
            archive_root: "3ds".to_string(),
            payload_extension: "3dsx".to_string(),
            strict_archive_prefix: true,
        }
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validates package manifests against limits using a remote fetcher.
pub struct ManifestValidator<'a> {
    /// Remote content access.
    fetcher: &'a dyn Fetcher,
    /// Active limits.
    limits: &'a ValidationLimits,
    /// Archive layout checks.
    inspector: ArchiveInspector,
    /// Directory for temporary downloads (system temp dir when unset).
    spool_dir: Option<PathBuf>,
}

impl<'a> ManifestValidator<'a> {
    /// Creates a validator.
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, limits: &'a ValidationLimits) -> Self {
        Self {
            fetcher,
            limits,
            inspector: ArchiveInspector::new(
                limits.archive_root.clone(),
                limits.payload_extension.clone(),
                limits.strict_archive_prefix,
            ),
            spool_dir: None,
        }
    }

    /// Spools downloads into `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }

    /// Parses and validates manifest text for a package directory.
    #[must_use]
    pub fn validate_text(&self, text: &str, declared_dir: &str) -> Vec<Violation> {
        match Manifest::parse(text, declared_dir) {
            Ok(manifest) => self.validate(&manifest),
            Err(violation) => vec![violation],
        }
    }

    /// Runs every check and returns violations in discovery order.
    #[must_use]
    pub fn validate(&self, manifest: &Manifest) -> Vec<Violation> {
        let mut violations = manifest.schema_violations();
        for entry in manifest.entries() {
            let ManifestEntry::Field {
                name,
                value,
            } = entry
            else {
                continue;
            };
            match (*name, value) {
                ("title", FieldValue::Text(title)) => {
                    if title.chars().count() > self.limits.max_title_chars {
                        violations.push(Violation::schema(format!(
                            "Value for `title` is too long. ({} char limit)",
                            self.limits.max_title_chars
                        )));
                    }
                }
                ("file", FieldValue::Url(url)) => violations.extend(self.check_file_url(url)),
                ("filesize", FieldValue::Integer(size)) => {
                    if *size > self.limits.max_file_bytes {
                        violations.push(Violation::schema(format!(
                            "Value for `filesize` is too large. ({} limit)",
                            format_limit(self.limits.max_file_bytes)
                        )));
                    }
                }
                ("screenshots", FieldValue::UrlList(urls)) => {
                    violations.extend(self.check_screenshots(urls));
                }
                _ => {}
            }
        }
        if violations.is_empty() {
            violations = self.check_file(manifest);
        }
        violations
    }

    /// Checks that the payload URL parses and can be opened.
    fn check_file_url(&self, url: &str) -> Option<Violation> {
        if parse_web_url(url).is_none() {
            return Some(Violation::schema("Value for `file` is not a valid http(s) URL."));
        }
        self.fetcher
            .open(url)
            .err()
            .map(|_| Violation::network("The URL provided by `file` cannot be opened."))
    }

    /// Checks the screenshot list; entries are fetched concurrently and
    /// reported in list order.
    fn check_screenshots(&self, urls: &[String]) -> Vec<Violation> {
        let mut violations = Vec::new();
        if urls.len() > self.limits.max_screenshots {
            violations.push(Violation::schema(format!(
                "Value for `screenshots` has too many entries. ({} image limit)",
                self.limits.max_screenshots
            )));
        }
        let checked = &urls[.. urls.len().min(self.limits.max_screenshots)];
        let results: Vec<Option<Violation>> = thread::scope(|scope| {
            let handles: Vec<_> = checked
                .iter()
                .map(|url| scope.spawn(move || self.check_screenshot_url(url)))
                .collect();
            handles
                .into_iter()
                .zip(checked)
                .map(|(handle, url)| {
                    handle.join().unwrap_or_else(|_| {
                        Some(Violation::network(format!("Screenshot `{url}` could not be checked.")))
                    })
                })
                .collect()
        });
        violations.extend(results.into_iter().flatten());
        violations
    }

    /// Checks one screenshot URL: syntax, host allowlist, fetch, and image shape.
    fn check_screenshot_url(&self, url: &str) -> Option<Violation> {
        let Some(parsed) = parse_web_url(url) else {
            return Some(Violation::schema(format!("Screenshot `{url}` is not a valid URL.")));
        };
        let host = parsed.host_str().unwrap_or_default();
        if !host_allowed(host, &self.limits.screenshot_hosts) {
            return Some(Violation::schema(format!(
                "Screenshot `{url}` is not hosted on an allowed image host."
            )));
        }
        match fetch_limited(self.fetcher, url, self.limits.max_screenshot_bytes) {
            Ok(bytes) => check_screenshot(
                url,
                &bytes,
                self.limits.screenshot_width,
                self.limits.screenshot_height,
            ),
            Err(_) => Some(Violation::network(format!("Screenshot `{url}` cannot be opened."))),
        }
    }

    /// Downloads the payload and verifies checksum, size, and archive layout.
    ///
    /// Runs only when `file`, `filesize`, and `file-md5` are all present and
    /// well-typed. The temporary download is removed before returning.
    #[must_use]
    pub fn check_file(&self, manifest: &Manifest) -> Vec<Violation> {
        let (Some(url), Some(declared_size), Some(declared_md5)) =
            (manifest.text("file"), manifest.integer("filesize"), manifest.text("file-md5"))
        else {
            return Vec::new();
        };
        let too_large = || {
            Violation::integrity(format!(
                "File provided is too large. ({} limit)",
                format_limit(self.limits.max_file_bytes)
            ))
        };
        let stream = match self.fetcher.open(url) {
            Ok(stream) => stream,
            Err(_) => {
                return vec![Violation::network("The URL provided by `file` cannot be opened.")];
            }
        };
        if stream.content_length.is_some_and(|length| length > self.limits.max_file_bytes) {
            return vec![too_large()];
        }
        let spooled =
            spool_download(stream.reader, self.limits.max_file_bytes, self.spool_dir.as_deref());
        let download = match spooled {
            Ok(download) => download,
            Err(err) => {
                return vec![Violation::network(format!(
                    "The file provided by `file` could not be downloaded. ({err})"
                ))];
            }
        };
        if download.exceeded() {
            return vec![too_large()];
        }
        let mut violations = Vec::new();
        if !download.md5_hex().eq_ignore_ascii_case(declared_md5.trim()) {
            violations.push(Violation::integrity(
                "Hash provided by `file-md5` does not match file checksum.",
            ));
        }
        if download.byte_count() != declared_size {
            violations.push(Violation::integrity("Value for `filesize` is incorrect."));
        }
        violations.extend(self.check_archive(download.path(), manifest.declared_dir()));
        violations
    }

    /// Detects, lists, and inspects the downloaded archive.
    fn check_archive(&self, path: &Path, declared_dir: &str) -> Vec<Violation> {
        let Some(kind) = self.inspector.detect(path) else {
            return vec![Violation::archive(format!(
                "`file` is not a recognized archive. Supported types: {SUPPORTED_TYPES}"
            ))];
        };
        match self.inspector.members(path, kind) {
            Ok(members) => self.inspector.inspect(&members, declared_dir),
            Err(err) => vec![Violation::archive(format!(
                "`file` could not be read as a {kind} archive. ({err})"
            ))],
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an absolute `http`/`https` URL with a host.
fn parse_web_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    let web = matches!(url.scheme(), "http" | "https") && url.host_str().is_some();
    web.then_some(url)
}

/// Matches a host against exact names and `*.suffix` wildcards.
fn host_allowed(host: &str, patterns: &[String]) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    patterns.iter().any(|pattern| {
        let pattern = pattern.trim().to_ascii_lowercase();
        pattern.strip_prefix("*.").map_or_else(
            || host == pattern,
            |suffix| {
                host.strip_suffix(suffix)
                    .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
            },
        )
    })
}

/// Renders a byte limit the way contributors read it (`100MB`).
fn format_limit(bytes: u64) -> String {
    if bytes >= MIB && bytes.is_multiple_of(MIB) {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} byte")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
