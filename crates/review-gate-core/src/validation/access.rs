// crates/review-gate-core/src/validation/access.rs
// ============================================================================
// Module: Access Policy
// Description: Path-scoped edit permissions and changeset authorization.
// Purpose: Decide whether an identity may modify each file of a changeset.
// Dependencies: crate::core, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! The access policy maps repository directories to the logins allowed to
//! edit files directly inside them. Lookup is by exact directory equality
//! (a grant on `apps/foo` does not cover `apps/foo/sub`), default-deny, and
//! first match wins. The sentinel [`EVERYONE`] opens a directory to any
//! contributor.
//!
//! Directory permission is necessary but not sufficient: an untrusted
//! contributor may only touch the contributor-editable filenames (the
//! manifest and icon by default) inside a permitted directory. Trusted
//! identities skip every check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_yaml::Value;
use thiserror::Error;

use crate::core::ChangedFile;
use crate::core::Changeset;
use crate::core::Identity;
use crate::core::Violation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reserved policy identity granting every contributor access.
pub const EVERYONE: &str = "$everyone$";

// ============================================================================
// SECTION: Access Policy
// ============================================================================

/// Result of a directory permission lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryDecision {
    /// The directory has no policy entry.
    NoEntry,
    /// The directory's entry does not list the identity.
    Excluded,
    /// The identity (or everyone) is listed for the directory.
    Allowed,
}

impl DirectoryDecision {
    /// Returns true when the decision grants access.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Single directory grant.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PolicyEntry {
    /// Normalized directory path.
    directory: String,
    /// Logins allowed to edit files in the directory.
    editors: BTreeSet<String>,
}

/// Directory to allowed-editors mapping.
///
/// # Invariants
/// - Directories are normalized with [`normalize_directory`].
/// - Entries keep document order; the first matching entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Ordered directory grants.
    entries: Vec<PolicyEntry>,
}

impl AccessPolicy {
    /// Builds a policy from `(directory, editors)` pairs.
    #[must_use]
    pub fn from_entries<I, D, E, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (D, E)>,
        D: AsRef<str>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(directory, editors)| PolicyEntry {
                directory: normalize_directory(directory.as_ref()),
                editors: editors.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self {
            entries,
        }
    }

    /// Parses a YAML policy document (`directory: [login, ...]`).
    ///
    /// A directory may map to a list of logins, a single login, or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyParseError`] when the document is not a mapping of
    /// directories to logins.
    pub fn from_yaml_str(text: &str) -> Result<Self, PolicyParseError> {
        let document: Value =
            serde_yaml::from_str(text).map_err(|err| PolicyParseError::Syntax {
                location: err.location().map_or_else(
                    || "unknown location".to_string(),
                    |location| format!("line {}, column {}", location.line(), location.column()),
                ),
                message: err.to_string(),
            })?;
        let mapping = match document {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(PolicyParseError::Shape(
                    "policy document must be a mapping of directories".to_string(),
                ));
            }
        };
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let directory = scalar_text(&key).ok_or_else(|| {
                PolicyParseError::Shape("policy directory keys must be scalars".to_string())
            })?;
            let editors = match value {
                Value::Null => BTreeSet::new(),
                Value::Sequence(items) => items
                    .iter()
                    .map(|item| {
                        scalar_text(item).ok_or_else(|| {
                            PolicyParseError::Shape(format!(
                                "editors for `{directory}` must be logins"
                            ))
                        })
                    })
                    .collect::<Result<BTreeSet<String>, PolicyParseError>>()?,
                other => {
                    let login = scalar_text(&other).ok_or_else(|| {
                        PolicyParseError::Shape(format!("editors for `{directory}` must be logins"))
                    })?;
                    BTreeSet::from([login])
                }
            };
            entries.push(PolicyEntry {
                directory: normalize_directory(&directory),
                editors,
            });
        }
        Ok(Self {
            entries,
        })
    }

    /// Looks up whether `login` may edit files directly inside `directory`.
    #[must_use]
    pub fn decision(&self, directory: &str, login: &str) -> DirectoryDecision {
        let directory = normalize_directory(directory);
        let Some(entry) = self.entries.iter().find(|entry| entry.directory == directory) else {
            return DirectoryDecision::NoEntry;
        };
        if entry.editors.contains(EVERYONE) || entry.editors.contains(login) {
            DirectoryDecision::Allowed
        } else {
            DirectoryDecision::Excluded
        }
    }

    /// Returns the number of directory entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the policy grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalizes a policy or file directory: trailing slashes are insignificant
/// and `""`, `"/"`, and `"."` all name the repository root.
#[must_use]
pub fn normalize_directory(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    if trimmed == "." { String::new() } else { trimmed.to_string() }
}

/// Renders a YAML scalar as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Access policy document errors.
#[derive(Debug, Error)]
pub enum PolicyParseError {
    /// YAML syntax error.
    #[error("cannot parse access policy at {location}: {message}")]
    Syntax {
        /// Rendered line and column of the error.
        location: String,
        /// Underlying parser message.
        message: String,
    },
    /// Document parsed but has the wrong structure.
    #[error("invalid access policy: {0}")]
    Shape(String),
}

// ============================================================================
// SECTION: Changeset Authorizer
// ============================================================================

/// Authorization outcome for one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAuthorization {
    /// Whether the directory-level check passed (always true for trusted identities).
    pub directory_passed: bool,
    /// Permission violation for the file, if any.
    pub violation: Option<Violation>,
}

/// Applies an [`AccessPolicy`] to every file of a changeset.
pub struct ChangesetAuthorizer<'a> {
    /// Directory grants.
    policy: &'a AccessPolicy,
    /// Filenames an untrusted contributor may edit inside a permitted directory.
    contributor_files: &'a BTreeSet<String>,
}

impl<'a> ChangesetAuthorizer<'a> {
    /// Creates an authorizer over the given policy.
    #[must_use]
    pub const fn new(policy: &'a AccessPolicy, contributor_files: &'a BTreeSet<String>) -> Self {
        Self {
            policy,
            contributor_files,
        }
    }

    /// Authorizes a single file for the acting identity.
    #[must_use]
    pub fn authorize_file(&self, file: &ChangedFile, identity: &Identity) -> FileAuthorization {
        if identity.trusted {
            return FileAuthorization {
                directory_passed: true,
                violation: None,
            };
        }
        let directory_passed =
            self.policy.decision(file.directory(), &identity.login).is_allowed();
        let file_permitted = directory_passed && self.contributor_files.contains(file.file_name());
        let violation = (!file_permitted).then(|| denied(identity, file));
        FileAuthorization {
            directory_passed,
            violation,
        }
    }

    /// Authorizes every file of the changeset, returning violations in file order.
    #[must_use]
    pub fn authorize(&self, changeset: &Changeset) -> Vec<Violation> {
        changeset
            .files
            .iter()
            .filter_map(|file| self.authorize_file(file, &changeset.author).violation)
            .collect()
    }
}

/// Builds the permission-denied violation for a file.
fn denied(identity: &Identity, file: &ChangedFile) -> Violation {
    Violation::permission(format!(
        "{} does not have permission to edit file {}",
        identity.markdown_link(),
        file.markdown_link()
    ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
