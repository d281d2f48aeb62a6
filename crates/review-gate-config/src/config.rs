// crates/review-gate-config/src/config.rs
// ============================================================================
// Module: Review Gate Configuration
// Description: Configuration loading and validation for Review Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: review-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to defaults; unknown keys are
//! rejected so that typos never silently weaken a limit.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use review_gate_core::ReviewSettings;
use review_gate_core::ValidationLimits;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "review-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "REVIEW_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Mebibyte.
const MIB: u64 = 1024 * 1024;
/// Maximum accepted webhook body size.
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Minimum host API timeout in milliseconds.
pub(crate) const MIN_HOST_TIMEOUT_MS: u64 = 100;
/// Maximum host API timeout in milliseconds.
pub(crate) const MAX_HOST_TIMEOUT_MS: u64 = 120_000;
/// Minimum fetch timeout in milliseconds.
pub(crate) const MIN_FETCH_TIMEOUT_MS: u64 = 100;
/// Maximum fetch timeout in milliseconds.
pub(crate) const MAX_FETCH_TIMEOUT_MS: u64 = 600_000;
/// Maximum redirects an outbound fetch may follow.
pub(crate) const MAX_REDIRECTS: u32 = 10;
/// Maximum review attempts before a mutating change is skipped.
pub(crate) const MAX_REVIEW_ATTEMPTS: u32 = 10;
/// Minimum per-review wall clock in milliseconds.
pub(crate) const MIN_REVIEW_TIMEOUT_MS: u64 = 1_000;
/// Maximum per-review wall clock in milliseconds.
pub(crate) const MAX_REVIEW_TIMEOUT_MS: u64 = 3_600_000;
/// Maximum screenshots a manifest may be allowed to list.
pub(crate) const MAX_SCREENSHOTS: usize = 32;
/// Maximum configured image dimension.
pub(crate) const MAX_IMAGE_DIMENSION: u32 = 4096;
/// Maximum configured payload size.
pub(crate) const MAX_FILE_BYTES: u64 = 4 * 1024 * MIB;

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Review Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewGateConfig {
    /// Webhook listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Source-control host configuration.
    #[serde(default)]
    pub host: HostConfig,
    /// Outbound content fetch policy.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Submission validation limits.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Review retry bounds.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ReviewGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order is the explicit path, then [`CONFIG_ENV_VAR`], then
    /// `review-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.host.validate()?;
        self.fetch.validate()?;
        self.validation.validate()?;
        self.review.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Builds orchestrator settings from the host, validation, and review sections.
    #[must_use]
    pub fn review_settings(&self) -> ReviewSettings {
        ReviewSettings {
            policy_path: self.host.policy_path.clone(),
            manifest_filename: self.validation.manifest_filename.clone(),
            icon_filename: self.validation.icon_filename.clone(),
            contributor_files: self.validation.contributor_files.iter().cloned().collect(),
            max_attempts: self.review.max_attempts,
            timeout: Duration::from_millis(self.review.timeout_ms),
            limits: self.validation.limits(),
            spool_dir: self.validation.spool_dir.as_ref().map(PathBuf::from),
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Webhook listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum webhook request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Path that receives webhook deliveries.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            webhook_path: default_webhook_path(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind must be a socket address".to_string()))
    }

    /// Validates listener settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must not exceed {MAX_BODY_BYTES}"
            )));
        }
        if !self.webhook_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "server.webhook_path must start with /".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Host
// ============================================================================

/// Source-control host API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Organization whose members are trusted (nobody is trusted when unset).
    #[serde(default)]
    pub trusted_org: Option<String>,
    /// Repository path of the access policy document.
    #[serde(default = "default_policy_path")]
    pub policy_path: String,
    /// User agent sent to the host API.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_host_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            trusted_org: None,
            policy_path: default_policy_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_host_timeout_ms(),
        }
    }
}

impl HostConfig {
    /// Validates host settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::Invalid(
                "host.api_base must include http:// or https://".to_string(),
            ));
        }
        let token_env = self.token_env.trim();
        if token_env.is_empty()
            || !token_env.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            return Err(ConfigError::Invalid(
                "host.token_env must be a non-empty environment variable name".to_string(),
            ));
        }
        if let Some(org) = &self.trusted_org
            && org.trim().is_empty()
        {
            return Err(ConfigError::Invalid("host.trusted_org must be non-empty".to_string()));
        }
        validate_path_string("host.policy_path", &self.policy_path)?;
        validate_non_empty("host.user_agent", &self.user_agent)?;
        validate_timeout_range(
            "host.timeout_ms",
            self.timeout_ms,
            MIN_HOST_TIMEOUT_MS,
            MAX_HOST_TIMEOUT_MS,
        )
    }
}

// ============================================================================
// SECTION: Fetch
// ============================================================================

/// Outbound content fetch policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
    /// Allow cleartext `http://` URLs.
    #[serde(default)]
    pub allow_http: bool,
    /// Allow private, loopback, and link-local destinations.
    #[serde(default)]
    pub allow_private_networks: bool,
    /// Maximum redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
    /// User agent sent with fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            allow_http: false,
            allow_private_networks: false,
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Validates fetch policy settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_range(
            "fetch.timeout_ms",
            self.timeout_ms,
            MIN_FETCH_TIMEOUT_MS,
            MAX_FETCH_TIMEOUT_MS,
        )?;
        if self.max_redirects > MAX_REDIRECTS {
            return Err(ConfigError::Invalid(format!(
                "fetch.max_redirects must not exceed {MAX_REDIRECTS}"
            )));
        }
        validate_non_empty("fetch.user_agent", &self.user_agent)
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Submission validation limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Manifest filename inside package directories.
    #[serde(default = "default_manifest_filename")]
    pub manifest_filename: String,
    /// Icon filename inside package directories.
    #[serde(default = "default_icon_filename")]
    pub icon_filename: String,
    /// Filenames untrusted contributors may edit in permitted directories.
    #[serde(default = "default_contributor_files")]
    pub contributor_files: Vec<String>,
    /// Install root directory inside payload archives.
    #[serde(default = "default_archive_root")]
    pub archive_root: String,
    /// Required payload file extension.
    #[serde(default = "default_payload_extension")]
    pub payload_extension: String,
    /// Maximum `title` length in characters.
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
    /// Maximum payload size in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Maximum number of screenshots.
    #[serde(default = "default_max_screenshots")]
    pub max_screenshots: usize,
    /// Required screenshot width.
    #[serde(default = "default_screenshot_width")]
    pub screenshot_width: u32,
    /// Required screenshot height.
    #[serde(default = "default_screenshot_height")]
    pub screenshot_height: u32,
    /// Required icon width.
    #[serde(default = "default_icon_side")]
    pub icon_width: u32,
    /// Required icon height.
    #[serde(default = "default_icon_side")]
    pub icon_height: u32,
    /// Allowed screenshot hosts (`host` or `*.suffix`).
    #[serde(default = "default_screenshot_hosts")]
    pub screenshot_hosts: Vec<String>,
    /// Maximum screenshot download size.
    #[serde(default = "default_max_screenshot_bytes")]
    pub max_screenshot_bytes: u64,
    /// Maximum icon download size.
    #[serde(default = "default_max_icon_bytes")]
    pub max_icon_bytes: u64,
    /// Maximum manifest download size.
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: u64,
    /// Require archive members to sit directly in the package directory.
    #[serde(default = "default_strict_archive_prefix")]
    pub strict_archive_prefix: bool,
    /// Directory for payload downloads (system temp dir when unset).
    #[serde(default)]
    pub spool_dir: Option<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            manifest_filename: default_manifest_filename(),
            icon_filename: default_icon_filename(),
            contributor_files: default_contributor_files(),
            archive_root: default_archive_root(),
            payload_extension: default_payload_extension(),
            max_title_chars: default_max_title_chars(),
            max_file_bytes: default_max_file_bytes(),
            max_screenshots: default_max_screenshots(),
            screenshot_width: default_screenshot_width(),
            screenshot_height: default_screenshot_height(),
            icon_width: default_icon_side(),
            icon_height: default_icon_side(),
            screenshot_hosts: default_screenshot_hosts(),
            max_screenshot_bytes: default_max_screenshot_bytes(),
            max_icon_bytes: default_max_icon_bytes(),
            max_manifest_bytes: default_max_manifest_bytes(),
            strict_archive_prefix: default_strict_archive_prefix(),
            spool_dir: None,
        }
    }
}

impl ValidationConfig {
    /// Returns the core validation limits for this section.
    #[must_use]
    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_title_chars: self.max_title_chars,
            max_file_bytes: self.max_file_bytes,
            max_screenshots: self.max_screenshots,
            screenshot_width: self.screenshot_width,
            screenshot_height: self.screenshot_height,
            icon_width: self.icon_width,
            icon_height: self.icon_height,
            screenshot_hosts: self
                .screenshot_hosts
                .iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .collect(),
            max_screenshot_bytes: self.max_screenshot_bytes,
            max_icon_bytes: self.max_icon_bytes,
            max_manifest_bytes: self.max_manifest_bytes,
            archive_root: self.archive_root.clone(),
            payload_extension: self.payload_extension.clone(),
            strict_archive_prefix: self.strict_archive_prefix,
        }
    }

    /// Validates limit ranges and filenames.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_file_name("validation.manifest_filename", &self.manifest_filename)?;
        validate_file_name("validation.icon_filename", &self.icon_filename)?;
        let mut seen = BTreeSet::new();
        for name in &self.contributor_files {
            validate_file_name("validation.contributor_files", name)?;
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "validation.contributor_files contains duplicate {name}"
                )));
            }
        }
        validate_file_name("validation.archive_root", &self.archive_root)?;
        validate_file_name("validation.payload_extension", &self.payload_extension)?;
        if self.payload_extension.contains('.') {
            return Err(ConfigError::Invalid(
                "validation.payload_extension must not contain a dot".to_string(),
            ));
        }
        if self.max_title_chars == 0 {
            return Err(ConfigError::Invalid(
                "validation.max_title_chars must be greater than zero".to_string(),
            ));
        }
        validate_byte_limit("validation.max_file_bytes", self.max_file_bytes, MAX_FILE_BYTES)?;
        if self.max_screenshots > MAX_SCREENSHOTS {
            return Err(ConfigError::Invalid(format!(
                "validation.max_screenshots must not exceed {MAX_SCREENSHOTS}"
            )));
        }
        validate_dimension("validation.screenshot_width", self.screenshot_width)?;
        validate_dimension("validation.screenshot_height", self.screenshot_height)?;
        validate_dimension("validation.icon_width", self.icon_width)?;
        validate_dimension("validation.icon_height", self.icon_height)?;
        for host in &self.screenshot_hosts {
            validate_host_pattern(host)?;
        }
        validate_byte_limit(
            "validation.max_screenshot_bytes",
            self.max_screenshot_bytes,
            64 * MIB,
        )?;
        validate_byte_limit("validation.max_icon_bytes", self.max_icon_bytes, 16 * MIB)?;
        validate_byte_limit("validation.max_manifest_bytes", self.max_manifest_bytes, MIB)?;
        if let Some(dir) = &self.spool_dir {
            validate_path_string("validation.spool_dir", dir)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Review
// ============================================================================

/// Review retry bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    /// Maximum attempts when the change mutates mid-review.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-review wall clock in milliseconds, checked between attempts.
    #[serde(default = "default_review_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            timeout_ms: default_review_timeout_ms(),
        }
    }
}

impl ReviewConfig {
    /// Validates retry bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_REVIEW_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "review.max_attempts must be between 1 and {MAX_REVIEW_ATTEMPTS}"
            )));
        }
        validate_timeout_range(
            "review.timeout_ms",
            self.timeout_ms,
            MIN_REVIEW_TIMEOUT_MS,
            MAX_REVIEW_TIMEOUT_MS,
        )
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Default webhook body cap.
const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default webhook path.
fn default_webhook_path() -> String {
    "/".to_string()
}

/// Default host API base.
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

/// Default token environment variable.
fn default_token_env() -> String {
    "REVIEW_GATE_TOKEN".to_string()
}

/// Default access policy path.
fn default_policy_path() -> String {
    "permissions.yml".to_string()
}

/// Default user agent.
fn default_user_agent() -> String {
    format!("review-gate/{}", env!("CARGO_PKG_VERSION"))
}

/// Default host API timeout.
const fn default_host_timeout_ms() -> u64 {
    10_000
}

/// Default fetch timeout.
const fn default_fetch_timeout_ms() -> u64 {
    60_000
}

/// Default redirect limit.
const fn default_max_redirects() -> u32 {
    5
}

/// Default manifest filename.
fn default_manifest_filename() -> String {
    "config.yml".to_string()
}

/// Default icon filename.
fn default_icon_filename() -> String {
    "icon.png".to_string()
}

/// Default contributor-editable filenames.
fn default_contributor_files() -> Vec<String> {
    vec![default_manifest_filename(), default_icon_filename()]
}

/// Default archive install root.
fn default_archive_root() -> String {
    "3ds".to_string()
}

/// Default payload extension.
fn default_payload_extension() -> String {
    "3dsx".to_string()
}

/// Default title length cap.
const fn default_max_title_chars() -> usize {
    25
}

/// Default payload size cap.
const fn default_max_file_bytes() -> u64 {
    100 * MIB
}

/// Default screenshot count cap.
const fn default_max_screenshots() -> usize {
    5
}

/// Default screenshot width.
const fn default_screenshot_width() -> u32 {
    400
}

/// Default screenshot height.
const fn default_screenshot_height() -> u32 {
    480
}

/// Default icon width and height.
const fn default_icon_side() -> u32 {
    48
}

/// Default screenshot host allowlist.
fn default_screenshot_hosts() -> Vec<String> {
    vec!["i.imgur.com".to_string()]
}

/// Default screenshot download cap.
const fn default_max_screenshot_bytes() -> u64 {
    8 * MIB
}

/// Default icon download cap.
const fn default_max_icon_bytes() -> u64 {
    MIB
}

/// Default manifest download cap.
const fn default_max_manifest_bytes() -> u64 {
    64 * 1024
}

/// Default archive prefix strictness.
const fn default_strict_archive_prefix() -> bool {
    true
}

/// Default review attempt bound.
const fn default_max_attempts() -> u32 {
    3
}

/// Default per-review wall clock.
const fn default_review_timeout_ms() -> u64 {
    600_000
}

/// Default audit enablement.
const fn default_audit_enabled() -> bool {
    true
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a bare filename (non-empty, no separators).
fn validate_file_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(ConfigError::Invalid(format!("{field} must not contain path separators")));
    }
    if value.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Validates a non-empty string field.
fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Validates a byte cap is non-zero and bounded.
fn validate_byte_limit(field: &str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between 1 and {max} bytes")));
    }
    Ok(())
}

/// Validates an image dimension is non-zero and bounded.
fn validate_dimension(field: &str, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_IMAGE_DIMENSION {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_IMAGE_DIMENSION}"
        )));
    }
    Ok(())
}

/// Validates a screenshot host entry (`host` or `*.suffix`).
fn validate_host_pattern(value: &str) -> Result<(), ConfigError> {
    let host = value.trim();
    let bare = host.strip_prefix("*.").unwrap_or(host);
    if bare.is_empty() || bare.contains(['/', ':', '*', ' ']) {
        return Err(ConfigError::Invalid(format!(
            "validation.screenshot_hosts entry `{value}` is not a host or *.suffix pattern"
        )));
    }
    Ok(())
}

/// Validates a timeout value against a range.
fn validate_timeout_range(
    field: &str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
