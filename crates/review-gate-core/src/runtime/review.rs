// crates/review-gate-core/src/runtime/review.rs
// ============================================================================
// Module: Review Orchestrator
// Description: Squash check, validation, re-verification, and verdicts.
// Purpose: Decide whether one pull request is merged, rejected, or skipped.
// Dependencies: crate::{core, interfaces, validation}, thiserror
// ============================================================================

//! ## Overview
//! A review walks RECEIVED, SQUASH_CHECK, AUTHORIZING, VALIDATING, and
//! VERIFYING before ending MERGED, REJECTED, or SKIPPED. Validation is slow
//! (payload downloads), so after it finishes the pull request's commit list is
//! fetched again; if the single reviewed commit is no longer the whole change,
//! the review restarts. Restarts are bounded by `max_attempts` and the
//! per-review wall clock, after which the review is skipped.
//!
//! Skips never post a comment. A rejection posts exactly one comment listing
//! every violation in discovery order; a merge posts the approval comment
//! first and then asks the host to merge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::core::ChangeKind;
use crate::core::ChangedFile;
use crate::core::Changeset;
use crate::core::RepositoryId;
use crate::core::Violation;
use crate::interfaces::Fetcher;
use crate::interfaces::HostClient;
use crate::interfaces::HostError;
use crate::interfaces::fetch_limited;
use crate::validation::AccessPolicy;
use crate::validation::ChangesetAuthorizer;
use crate::validation::ManifestValidator;
use crate::validation::PolicyParseError;
use crate::validation::ValidationLimits;
use crate::validation::check_icon;

// ============================================================================
// SECTION: Comment Texts
// ============================================================================

/// Comment posted before a pull request is merged.
pub const APPROVAL_COMMENT: &str =
    "Everything looks good to me, so I've automatically merged it for you.";

/// Renders the squash request for a multi-commit pull request.
#[must_use]
pub fn squash_comment(commit_count: u64) -> String {
    format!(
        "This PR cannot be reviewed/merged properly until the {commit_count} commits are \
         squashed into 1."
    )
}

/// Renders the itemized rejection comment.
#[must_use]
pub fn rejection_comment(violations: &[Violation]) -> String {
    let mut body = String::from("This pull request cannot be merged for the following reasons:\n");
    for violation in violations {
        body.push_str("- ");
        body.push_str(violation.message());
        body.push('\n');
    }
    body
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Review orchestration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSettings {
    /// Repository path of the access policy document.
    pub policy_path: String,
    /// Manifest filename inside package directories.
    pub manifest_filename: String,
    /// Icon filename inside package directories.
    pub icon_filename: String,
    /// Filenames untrusted contributors may edit in permitted directories.
    pub contributor_files: BTreeSet<String>,
    /// Maximum review attempts when the change mutates mid-review.
    pub max_attempts: u32,
    /// Wall-clock budget checked before each retry.
    pub timeout: Duration,
    /// Validation limits.
    pub limits: ValidationLimits,
    /// Directory for payload downloads (system temp dir when unset).
    pub spool_dir: Option<PathBuf>,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            policy_path: "permissions.yml".to_string(),
            manifest_filename: "config.yml".to_string(),
            icon_filename: "icon.png".to_string(),
            contributor_files: BTreeSet::from(["config.yml".to_string(), "icon.png".to_string()]),
            max_attempts: 3,
            timeout: Duration::from_secs(600),
            limits: ValidationLimits::default(),
            spool_dir: None,
        }
    }
}

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Why a review ended without a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Pull request was already merged.
    AlreadyMerged,
    /// Host reports the pull request cannot be merged.
    NotMergeable,
    /// Pull request has no commits.
    NoCommits,
    /// The change kept mutating until the attempt bound was reached.
    ChangeMutated,
    /// The review wall clock ran out before a stable verdict.
    TimedOut,
}

/// Why a pull request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// More than one commit; squash requested.
    MultipleCommits(u64),
    /// Validation produced violations.
    Violations,
}

/// Terminal review outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Approved and merged.
    Merged,
    /// Rejected with a comment.
    Rejected(RejectReason),
    /// Left alone without a comment.
    Skipped(SkipReason),
}

impl Verdict {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::Rejected(RejectReason::MultipleCommits(_)) => "rejected_multiple_commits",
            Self::Rejected(RejectReason::Violations) => "rejected",
            Self::Skipped(SkipReason::AlreadyMerged) => "skipped_already_merged",
            Self::Skipped(SkipReason::NotMergeable) => "skipped_not_mergeable",
            Self::Skipped(SkipReason::NoCommits) => "skipped_no_commits",
            Self::Skipped(SkipReason::ChangeMutated) => "skipped_change_mutated",
            Self::Skipped(SkipReason::TimedOut) => "skipped_timed_out",
        }
    }
}

/// Result of one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewReport {
    /// Terminal outcome.
    pub verdict: Verdict,
    /// Number of review passes started.
    pub attempts: u32,
    /// Commit the verdict applies to, when one was evaluated.
    pub commit_id: Option<String>,
    /// Violations in discovery order (empty unless rejected for violations).
    pub violations: Vec<Violation>,
}

impl ReviewReport {
    /// Builds a report without violations.
    fn bare(verdict: Verdict, attempts: u32, commit_id: Option<String>) -> Self {
        Self {
            verdict,
            attempts,
            commit_id,
            violations: Vec::new(),
        }
    }
}

/// Administrative failures that abort a review.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Access policy document could not be parsed.
    #[error(transparent)]
    Policy(#[from] PolicyParseError),
    /// Access policy document is not UTF-8.
    #[error("access policy is not valid utf-8: {0}")]
    PolicyEncoding(String),
    /// Host API failure.
    #[error(transparent)]
    Host(#[from] HostError),
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Review state machine over a host client and a remote fetcher.
pub struct ReviewOrchestrator<H, F> {
    /// Source-control host.
    host: H,
    /// Remote content access for manifests, icons, and payloads.
    fetcher: F,
    /// Review settings.
    settings: ReviewSettings,
}

impl<H, F> ReviewOrchestrator<H, F>
where
    H: HostClient,
    F: Fetcher,
{
    /// Creates an orchestrator.
    #[must_use]
    pub const fn new(host: H, fetcher: F, settings: ReviewSettings) -> Self {
        Self {
            host,
            fetcher,
            settings,
        }
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// Reviews one pull request to a terminal verdict.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError`] when the access policy cannot be loaded or the
    /// host API fails; no comment is posted in that case.
    pub fn review(&self, repo: RepositoryId, number: u64) -> Result<ReviewReport, ReviewError> {
        let started = Instant::now();
        let policy = self.load_policy(repo)?;
        let mut attempts: u32 = 0;
        while attempts < self.settings.max_attempts {
            if attempts > 0 && started.elapsed() >= self.settings.timeout {
                return Ok(ReviewReport::bare(
                    Verdict::Skipped(SkipReason::TimedOut),
                    attempts,
                    None,
                ));
            }
            attempts += 1;

            let pull = self.host.pull_request(repo, number)?;
            if pull.merged {
                return Ok(ReviewReport::bare(
                    Verdict::Skipped(SkipReason::AlreadyMerged),
                    attempts,
                    None,
                ));
            }
            if pull.mergeable != Some(true) {
                return Ok(ReviewReport::bare(
                    Verdict::Skipped(SkipReason::NotMergeable),
                    attempts,
                    None,
                ));
            }
            if pull.commit_count > 1 {
                self.host.post_comment(repo, number, &squash_comment(pull.commit_count))?;
                return Ok(ReviewReport::bare(
                    Verdict::Rejected(RejectReason::MultipleCommits(pull.commit_count)),
                    attempts,
                    None,
                ));
            }

            let commits = self.host.pull_commits(repo, number)?;
            let commit_id = match commits.as_slice() {
                [] => {
                    return Ok(ReviewReport::bare(
                        Verdict::Skipped(SkipReason::NoCommits),
                        attempts,
                        None,
                    ));
                }
                [only] => only.clone(),
                _ => continue,
            };

            let changeset = self.host.commit_changeset(repo, &commit_id)?;
            let violations = self.evaluate(&policy, &changeset);

            let current = self.host.pull_commits(repo, number)?;
            if current.as_slice() != [commit_id.as_str()] {
                continue;
            }

            if violations.is_empty() {
                self.host.post_comment(repo, number, APPROVAL_COMMENT)?;
                self.host.merge(repo, number)?;
                return Ok(ReviewReport::bare(Verdict::Merged, attempts, Some(commit_id)));
            }
            self.host.post_comment(repo, number, &rejection_comment(&violations))?;
            return Ok(ReviewReport {
                verdict: Verdict::Rejected(RejectReason::Violations),
                attempts,
                commit_id: Some(commit_id),
                violations,
            });
        }
        Ok(ReviewReport::bare(Verdict::Skipped(SkipReason::ChangeMutated), attempts, None))
    }

    /// Fetches and parses the access policy document.
    fn load_policy(&self, repo: RepositoryId) -> Result<AccessPolicy, ReviewError> {
        let bytes = self.host.file_contents(repo, &self.settings.policy_path)?;
        let text =
            String::from_utf8(bytes).map_err(|err| ReviewError::PolicyEncoding(err.to_string()))?;
        Ok(AccessPolicy::from_yaml_str(&text)?)
    }

    /// Runs permission and artifact checks over every changed file.
    ///
    /// When the author lacks directory permission, only the first such
    /// manifest is fully validated; manifests in permitted directories are
    /// always validated.
    #[must_use]
    pub fn evaluate(&self, policy: &AccessPolicy, changeset: &Changeset) -> Vec<Violation> {
        let authorizer = ChangesetAuthorizer::new(policy, &self.settings.contributor_files);
        let mut validator = ManifestValidator::new(&self.fetcher, &self.settings.limits);
        if let Some(dir) = &self.settings.spool_dir {
            validator = validator.with_spool_dir(dir);
        }
        let mut violations = Vec::new();
        let mut manifests_checked: u32 = 0;
        for file in &changeset.files {
            let authorization = authorizer.authorize_file(file, &changeset.author);
            violations.extend(authorization.violation);
            if file.change == ChangeKind::Removed {
                continue;
            }
            if file.file_name() == self.settings.manifest_filename {
                if manifests_checked < 1 || authorization.directory_passed {
                    manifests_checked += 1;
                    violations.extend(self.check_manifest(&validator, file));
                }
            } else if file.file_name() == self.settings.icon_filename {
                violations.extend(self.check_icon_file(file));
            }
        }
        violations
    }

    /// Downloads and validates one manifest.
    fn check_manifest(
        &self,
        validator: &ManifestValidator<'_>,
        file: &ChangedFile,
    ) -> Vec<Violation> {
        let limit = self.settings.limits.max_manifest_bytes;
        let bytes = match fetch_limited(&self.fetcher, &file.raw_url, limit) {
            Ok(bytes) => bytes,
            Err(err) => {
                return vec![Violation::network(format!(
                    "{} cannot be downloaded. ({err})",
                    file.markdown_link()
                ))];
            }
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return vec![Violation::schema("Error parsing configuration file.")];
        };
        validator.validate_text(&text, file.package_dir())
    }

    /// Downloads and header-checks one icon.
    fn check_icon_file(&self, file: &ChangedFile) -> Option<Violation> {
        let limits = &self.settings.limits;
        match fetch_limited(&self.fetcher, &file.raw_url, limits.max_icon_bytes) {
            Ok(bytes) => {
                check_icon(&file.markdown_link(), &bytes, limits.icon_width, limits.icon_height)
            }
            Err(err) => Some(Violation::network(format!(
                "{} cannot be downloaded. ({err})",
                file.markdown_link()
            ))),
        }
    }
}
