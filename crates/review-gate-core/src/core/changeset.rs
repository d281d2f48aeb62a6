// crates/review-gate-core/src/core/changeset.rs
// ============================================================================
// Module: Review Gate Changesets
// Description: File descriptors for the single commit under review.
// Purpose: Describe changed paths and where their contents can be fetched.
// Dependencies: crate::core::identity, serde
// ============================================================================

//! ## Overview
//! A [`Changeset`] is produced by the host client for the one commit a pull
//! request carries. The core consumes it read-only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identity::Identity;

// ============================================================================
// SECTION: Repository Identifier
// ============================================================================

/// Numeric repository identifier assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(pub u64);

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SECTION: Changed Files
// ============================================================================

/// Declared change type for a file in the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// File was created.
    Added,
    /// File contents changed.
    #[default]
    Modified,
    /// File was deleted.
    Removed,
    /// File was moved.
    Renamed,
}

impl ChangeKind {
    /// Parses a host status label, treating unknown labels as modifications.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status {
            "added" => Self::Added,
            "removed" => Self::Removed,
            "renamed" => Self::Renamed,
            _ => Self::Modified,
        }
    }
}

/// File touched by the reviewed commit.
///
/// # Invariants
/// - `path` is repository-relative and uses `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path.
    pub path: String,
    /// URL serving the raw file contents at the reviewed commit.
    pub raw_url: String,
    /// URL of the file's web view, used in violation messages.
    pub blob_url: String,
    /// Declared change type.
    #[serde(default)]
    pub change: ChangeKind,
}

impl ChangedFile {
    /// Returns the containing directory (empty for top-level files).
    #[must_use]
    pub fn directory(&self) -> &str {
        self.path.rfind('/').map_or("", |idx| self.path[.. idx].trim_end_matches('/'))
    }

    /// Returns the final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rfind('/').map_or(self.path.as_str(), |idx| &self.path[idx + 1 ..])
    }

    /// Returns the name of the enclosing directory (the package directory).
    #[must_use]
    pub fn package_dir(&self) -> &str {
        let dir = self.directory();
        dir.rfind('/').map_or(dir, |idx| &dir[idx + 1 ..])
    }

    /// Renders the file as a Markdown link to its web view.
    #[must_use]
    pub fn markdown_link(&self) -> String {
        format!("[{}]({})", self.path, self.blob_url)
    }
}

// ============================================================================
// SECTION: Changeset
// ============================================================================

/// The single commit carried by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Commit identifier that was evaluated.
    pub commit_id: String,
    /// Committer identity.
    pub author: Identity,
    /// Files touched by the commit, in host order.
    pub files: Vec<ChangedFile>,
}
