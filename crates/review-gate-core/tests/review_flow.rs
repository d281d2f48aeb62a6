// crates/review-gate-core/tests/review_flow.rs
// ============================================================================
// Module: Review Flow Tests
// Description: End-to-end review state machine over in-memory fakes.
// Purpose: Validate merge, rejection, skip, and re-verification behavior.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! Drives [`ReviewOrchestrator`] against a scripted host and a map-backed
//! fetcher, checking verdicts and the exact comments and merges issued.

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

use std::collections::VecDeque;

use review_gate_core::APPROVAL_COMMENT;
use review_gate_core::ChangeKind;
use review_gate_core::Changeset;
use review_gate_core::RejectReason;
use review_gate_core::RepositoryId;
use review_gate_core::ReviewError;
use review_gate_core::ReviewOrchestrator;
use review_gate_core::ReviewSettings;
use review_gate_core::SkipReason;
use review_gate_core::Verdict;
use review_gate_core::squash_comment;

use crate::common::MapFetcher;
use crate::common::ScriptedHost;
use crate::common::changed_file;
use crate::common::contributor;
use crate::common::manifest_for;
use crate::common::png_header;
use crate::common::zip_bytes;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Repository under review.
const REPO: RepositoryId = RepositoryId(42);
/// Pull request number under review.
const PULL: u64 = 7;
/// Payload URL used by fixtures.
const FILE_URL: &str = "https://files.example/app1.zip";
/// Policy granting alice the `apps/app1` directory.
const POLICY: &str = "apps/app1:\n  - alice\n";

/// Changeset by alice editing the app1 manifest and icon.
fn app1_changeset(commit_id: &str) -> Changeset {
    Changeset {
        commit_id: commit_id.to_string(),
        author: contributor("alice"),
        files: vec![changed_file("apps/app1/config.yml"), changed_file("apps/app1/icon.png")],
    }
}

/// Fetcher serving a valid manifest, icon, and payload for app1.
fn app1_fetcher() -> MapFetcher {
    let payload = zip_bytes(&["3ds/", "3ds/app1/", "3ds/app1/app1.3dsx"]);
    MapFetcher::new()
        .with("https://raw.example/apps/app1/config.yml", manifest_for(FILE_URL, &payload))
        .with("https://raw.example/apps/app1/icon.png", png_header(48, 48))
        .with(FILE_URL, payload)
}

// ============================================================================
// SECTION: Verdicts
// ============================================================================

#[test]
fn valid_single_commit_change_is_merged() {
    let host = ScriptedHost::single_commit(POLICY, app1_changeset("c1"));
    let orchestrator = ReviewOrchestrator::new(&host, app1_fetcher(), ReviewSettings::default());
    let report = orchestrator.review(REPO, PULL).unwrap();
    assert_eq!(report.verdict, Verdict::Merged);
    assert!(report.violations.is_empty());
    assert_eq!(report.commit_id.as_deref(), Some("c1"));
    assert_eq!(host.comments(), vec![APPROVAL_COMMENT.to_string()]);
    assert_eq!(host.merge_count(), 1);
}

#[test]
fn two_commit_change_requests_squash_without_merging() {
    let mut host = ScriptedHost::single_commit(POLICY, app1_changeset("c1"));
    host.pull.commit_count = 2;
    let orchestrator = ReviewOrchestrator::new(&host, app1_fetcher(), ReviewSettings::default());
    let report = orchestrator.review(REPO, PULL).unwrap();
    assert_eq!(report.verdict, Verdict::Rejected(RejectReason::MultipleCommits(2)));
    assert_eq!(host.comments(), vec![squash_comment(2)]);
    assert_eq!(
        host.comments()[0],
        "This PR cannot be reviewed/merged properly until the 2 commits are squashed into 1."
    );
    assert_eq!(host.merge_count(), 0);
}

#[test]
fn violations_are_posted_as_one_itemized_comment() {
    let mut changeset = app1_changeset("c1");
    changeset.files.push(changed_file("apps/app2/config.yml"));
    let host = ScriptedHost::single_commit(POLICY, changeset);
    let fetcher = app1_fetcher()
        .with("https://raw.example/apps/app1/icon.png", png_header(64, 64))
        .with("https://raw.example/apps/app2/config.yml", "title: App Two\n");
    let orchestrator = ReviewOrchestrator::new(&host, fetcher, ReviewSettings::default());
    let report = orchestrator.review(REPO, PULL).unwrap();
    assert_eq!(report.verdict, Verdict::Rejected(RejectReason::Violations));
    assert_eq!(report.violations.len(), 2);
    assert_eq!(host.merge_count(), 0);
    let comments = host.comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(
        comments[0],
        "This pull request cannot be merged for the following reasons:\n- \
         [apps/app1/icon.png](https://blob.example/apps/app1/icon.png) dimensions need to be \
         48x48 (found 64x64)\n- [alice](https://github.com/alice) does not have permission to \
         edit file [apps/app2/config.yml](https://blob.example/apps/app2/config.yml)\n"
    );
}

#[test]
fn unpermitted_manifests_beyond_the_first_are_not_validated() {
    let changeset = Changeset {
        commit_id: "c1".to_string(),
        author: contributor("mallory"),
        files: vec![changed_file("apps/x/config.yml"), changed_file("apps/y/config.yml")],
    };
    let host = ScriptedHost::single_commit(POLICY, changeset);
    let fetcher = MapFetcher::new()
        .with("https://raw.example/apps/x/config.yml", "title: X\n")
        .with("https://raw.example/apps/y/config.yml", "title: Y\n");
    let orchestrator = ReviewOrchestrator::new(&host, fetcher, ReviewSettings::default());
    let report = orchestrator.review(REPO, PULL).unwrap();
    let permission = report
        .violations
        .iter()
        .filter(|violation| violation.message().contains("does not have permission"))
        .count();
    assert_eq!(permission, 2);
    assert_eq!(report.violations.len(), 2 + 6);
}

#[test]
fn removed_files_skip_content_checks() {
    let mut changeset = app1_changeset("c1");
    changeset.files.truncate(1);
    changeset.files[0].change = ChangeKind::Removed;
    let host = ScriptedHost::single_commit(POLICY, changeset);
    let orchestrator = ReviewOrchestrator::new(&host, MapFetcher::new(), ReviewSettings::default());
    let report = orchestrator.review(REPO, PULL).unwrap();
    assert_eq!(report.verdict, Verdict::Merged);
}

// ============================================================================
// SECTION: Skips
// ============================================================================

#[test]
fn merged_or_unmergeable_changes_are_skipped_silently() {
    let mut host = ScriptedHost::single_commit(POLICY, app1_changeset("c1"));
    host.pull.merged = true;
    let report = ReviewOrchestrator::new(&host, app1_fetcher(), ReviewSettings::default())
        .review(REPO, PULL)
        .unwrap();
    assert_eq!(report.verdict, Verdict::Skipped(SkipReason::AlreadyMerged));

    host.pull.merged = false;
    host.pull.mergeable = None;
    let report = ReviewOrchestrator::new(&host, app1_fetcher(), ReviewSettings::default())
        .review(REPO, PULL)
        .unwrap();
    assert_eq!(report.verdict, Verdict::Skipped(SkipReason::NotMergeable));
    assert!(host.comments().is_empty());
    assert_eq!(host.merge_count(), 0);
}

// ============================================================================
// SECTION: Re-Verification
// ============================================================================

#[test]
fn mutation_during_validation_restarts_review() {
    let mut host = ScriptedHost::single_commit(POLICY, app1_changeset("c1"));
    host.changesets.insert("c2".to_string(), app1_changeset("c2"));
    host.commit_lists = std::sync::Mutex::new(VecDeque::from([
        vec!["c1".to_string()],
        vec!["c2".to_string()],
        vec!["c2".to_string()],
    ]));
    let orchestrator = ReviewOrchestrator::new(&host, app1_fetcher(), ReviewSettings::default());
    let report = orchestrator.review(REPO, PULL).unwrap();
    assert_eq!(report.verdict, Verdict::Merged);
    assert_eq!(report.attempts, 2);
    assert_eq!(report.commit_id.as_deref(), Some("c2"));
    assert_eq!(host.merge_count(), 1);
}

#[test]
fn endless_mutation_is_bounded() {
    let mut host = ScriptedHost::single_commit(POLICY, app1_changeset("c1"));
    let mut lists = VecDeque::new();
    for index in 0 .. 20 {
        let id = format!("c{index}");
        host.changesets.insert(id.clone(), app1_changeset(&id));
        lists.push_back(vec![id]);
    }
    host.commit_lists = std::sync::Mutex::new(lists);
    let settings = ReviewSettings {
        max_attempts: 3,
        ..ReviewSettings::default()
    };
    let report = ReviewOrchestrator::new(&host, app1_fetcher(), settings).review(REPO, PULL).unwrap();
    assert_eq!(report.verdict, Verdict::Skipped(SkipReason::ChangeMutated));
    assert_eq!(report.attempts, 3);
    assert!(host.comments().is_empty());
    assert_eq!(host.merge_count(), 0);
}

// ============================================================================
// SECTION: Administrative Failures
// ============================================================================

#[test]
fn unparsable_policy_aborts_without_comment() {
    let host = ScriptedHost::single_commit("apps/app1: [alice\n", app1_changeset("c1"));
    let result =
        ReviewOrchestrator::new(&host, app1_fetcher(), ReviewSettings::default()).review(REPO, PULL);
    assert!(matches!(result, Err(ReviewError::Policy(_))));
    assert!(host.comments().is_empty());
}
