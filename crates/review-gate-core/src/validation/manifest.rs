// crates/review-gate-core/src/validation/manifest.rs
// ============================================================================
// Module: Package Manifest
// Description: Closed-schema package manifest with typed field values.
// Purpose: Parse manifest documents into recognized, typed fields.
// Dependencies: crate::core, serde_yaml
// ============================================================================

//! ## Overview
//! A manifest is a YAML mapping describing one publishable package. Fields
//! are checked against [`MANIFEST_SCHEMA`]: every recognized field has a fixed
//! type, and anything outside the table is recorded as an unknown field so it
//! can be flagged rather than silently ignored. Parsing never fails on field
//! content; type mismatches are kept as schema findings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_yaml::Value;

use crate::core::Violation;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Value type of a recognized manifest field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text (scalars are rendered as text).
    Text,
    /// Non-negative integer.
    Integer,
    /// Single URL string.
    Url,
    /// List of URL strings.
    UrlList,
    /// Boolean flag.
    Flag,
}

impl FieldType {
    /// Describes the expected value for schema messages.
    const fn expectation(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "a number",
            Self::Url => "a URL",
            Self::UrlList => "a list of URLs",
            Self::Flag => "true or false",
        }
    }
}

/// Schema entry for a recognized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as written in the manifest.
    pub name: &'static str,
    /// Whether the field must be present.
    pub required: bool,
    /// Expected value type.
    pub field_type: FieldType,
}

/// Recognized manifest fields, required fields first.
pub const MANIFEST_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "title",
        required: true,
        field_type: FieldType::Text,
    },
    FieldSpec {
        name: "author",
        required: true,
        field_type: FieldType::Text,
    },
    FieldSpec {
        name: "version",
        required: true,
        field_type: FieldType::Text,
    },
    FieldSpec {
        name: "description",
        required: true,
        field_type: FieldType::Text,
    },
    FieldSpec {
        name: "file",
        required: true,
        field_type: FieldType::Url,
    },
    FieldSpec {
        name: "filesize",
        required: true,
        field_type: FieldType::Integer,
    },
    FieldSpec {
        name: "file-md5",
        required: true,
        field_type: FieldType::Text,
    },
    FieldSpec {
        name: "long-description",
        required: false,
        field_type: FieldType::Text,
    },
    FieldSpec {
        name: "n3ds-only",
        required: false,
        field_type: FieldType::Flag,
    },
    FieldSpec {
        name: "screenshots",
        required: false,
        field_type: FieldType::UrlList,
    },
    FieldSpec {
        name: "install-message",
        required: false,
        field_type: FieldType::Text,
    },
];

/// Looks up the schema entry for a field name.
fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    MANIFEST_SCHEMA.iter().find(|spec| spec.name == name)
}

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// Typed value of a recognized field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(u64),
    /// URL value (not yet syntax-checked).
    Url(String),
    /// List of URL values.
    UrlList(Vec<String>),
    /// Boolean flag.
    Flag(bool),
}

/// Entry of a parsed manifest in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    /// Recognized field with a value of the expected type.
    Field {
        /// Field name.
        name: &'static str,
        /// Typed value.
        value: FieldValue,
    },
    /// Recognized field whose value has the wrong type.
    Malformed {
        /// Field name.
        name: &'static str,
        /// Expected value type.
        expected: FieldType,
    },
    /// Field outside the recognized set.
    Unknown {
        /// Field name as written.
        name: String,
    },
}

/// Parsed package manifest.
///
/// # Invariants
/// - `entries` preserves document order.
/// - `declared_dir` is the name of the package directory holding the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Package directory name derived from the manifest's path.
    declared_dir: String,
    /// Entries in document order.
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Parses manifest YAML text for the given package directory.
    ///
    /// # Errors
    ///
    /// Returns a schema [`Violation`] when the text is not a YAML mapping.
    pub fn parse(text: &str, declared_dir: &str) -> Result<Self, Violation> {
        let document: Value = serde_yaml::from_str(text).map_err(|err| {
            let location = err
                .location()
                .map(|location| {
                    format!(" (line {}, column {})", location.line(), location.column())
                })
                .unwrap_or_default();
            Violation::schema(format!("Error parsing configuration file.{location}"))
        })?;
        let Value::Mapping(mapping) = document else {
            return Err(Violation::schema("Error parsing configuration file."));
        };
        let entries = mapping.iter().map(|(key, value)| classify(key, value)).collect();
        Ok(Self {
            declared_dir: declared_dir.to_string(),
            entries,
        })
    }

    /// Builds a manifest from already-typed fields.
    #[must_use]
    pub fn from_fields<I>(declared_dir: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, FieldValue)>,
    {
        let entries = fields
            .into_iter()
            .map(|(name, value)| match field_spec(name) {
                Some(spec) => ManifestEntry::Field {
                    name: spec.name,
                    value,
                },
                None => ManifestEntry::Unknown {
                    name: name.to_string(),
                },
            })
            .collect();
        Self {
            declared_dir: declared_dir.to_string(),
            entries,
        }
    }

    /// Returns the declared package directory name.
    #[must_use]
    pub fn declared_dir(&self) -> &str {
        &self.declared_dir
    }

    /// Returns all entries in document order.
    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Returns true when the named field is present (well-typed or not).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| match entry {
            ManifestEntry::Field {
                name: field, ..
            }
            | ManifestEntry::Malformed {
                name: field, ..
            } => *field == name,
            ManifestEntry::Unknown {
                ..
            } => false,
        })
    }

    /// Returns the typed value of a field when present and well-typed.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find_map(|entry| match entry {
            ManifestEntry::Field {
                name: field,
                value,
            } if *field == name => Some(value),
            _ => None,
        })
    }

    /// Returns a text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Text(text) | FieldValue::Url(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns an integer field.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// Returns the schema violations: missing required fields in schema order,
    /// then unknown and malformed fields in document order.
    #[must_use]
    pub fn schema_violations(&self) -> Vec<Violation> {
        let mut violations: Vec<Violation> = MANIFEST_SCHEMA
            .iter()
            .filter(|spec| spec.required && !self.contains(spec.name))
            .map(|spec| {
                Violation::schema(format!(
                    "Key `{}` required but not found in configuration file.",
                    spec.name
                ))
            })
            .collect();
        for entry in &self.entries {
            match entry {
                ManifestEntry::Unknown {
                    name,
                } => violations.push(Violation::schema(format!(
                    "Unknown field `{name}` in configuration file."
                ))),
                ManifestEntry::Malformed {
                    name,
                    expected,
                } => violations.push(Violation::schema(format!(
                    "Improper value for `{name}`. Must be {}.",
                    expected.expectation()
                ))),
                ManifestEntry::Field {
                    ..
                } => {}
            }
        }
        violations
    }
}

/// Classifies one mapping entry against the schema.
fn classify(key: &Value, value: &Value) -> ManifestEntry {
    let Some(spec) = key.as_str().and_then(field_spec) else {
        return ManifestEntry::Unknown {
            name: key_label(key),
        };
    };
    convert(spec.field_type, value).map_or(
        ManifestEntry::Malformed {
            name: spec.name,
            expected: spec.field_type,
        },
        |value| ManifestEntry::Field {
            name: spec.name,
            value,
        },
    )
}

/// Converts a YAML value to the expected field type.
fn convert(field_type: FieldType, value: &Value) -> Option<FieldValue> {
    match field_type {
        FieldType::Text => scalar_text(value).map(FieldValue::Text),
        FieldType::Integer => value.as_u64().map(FieldValue::Integer),
        FieldType::Url => value.as_str().map(|url| FieldValue::Url(url.to_string())),
        FieldType::UrlList => value
            .as_sequence()?
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()
            .map(FieldValue::UrlList),
        FieldType::Flag => value.as_bool().map(FieldValue::Flag),
    }
}

/// Renders a scalar as text; versions such as `1.0` arrive as numbers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Renders a mapping key for unknown-field messages.
fn key_label(key: &Value) -> String {
    scalar_text(key).unwrap_or_else(|| "<non-scalar key>".to_string())
}
