//! # Record Mirror - Domain Model
//!
//! Core types for mirroring primary-store records into a flat key-value
//! cache representation. These types are shared by the codec, writer and
//! reader in `mirror-cache` and carry no I/O of their own.
//!
//! A record type declares a [`FieldSchema`] once, at registration time:
//! which fields are scalars, which associations it owns for cache
//! purposes, and which fields live outside the flat hash entirely.
//! Classification of flat-entry keys is driven by that schema, so a
//! scalar name containing digits can never be mistaken for an encoded
//! association subfield.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// FLAT REPRESENTATION
// =============================================================================

/// A record flattened into string key/value pairs, as stored under
/// `"<type>:<id>"` in the cache backend.
pub type FlatEntry = HashMap<String, String>;

/// Subfields of one nested record at one association index, with the
/// `<singular><index>` prefix already stripped (`video0url=a` -> `url=a`).
pub type SubFieldMap = HashMap<String, String>;

// =============================================================================
// FIELD SCHEMA
// =============================================================================

/// Whether an association holds one nested record or an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plurality {
    /// At most one nested record, encoded at index 0.
    Singular,
    /// Ordered list, encoded at dense indices 0..N.
    Plural,
}

/// Declaration of one cache-visible association.
///
/// Associations not declared here are invisible to the cache layer. That
/// is how back-references to other top-level mirrored types are kept out
/// of the flat entry (preventing cyclic storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationSchema {
    /// Association name as the record exposes it (`"videos"`).
    pub name: &'static str,
    /// Singular form used in encoded keys (`"video"` -> `video0id`).
    pub singular: &'static str,
    pub plurality: Plurality,
    /// Subfield that must be present at an index for a nested record to
    /// count as present there. Decoding stops at the first index where
    /// it is missing.
    pub key_subfield: &'static str,
}

/// Per-type schema declared once at type-registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    /// Lowercased type name, first half of the `"<type>:<id>"` entry key.
    pub type_name: &'static str,
    /// Pluralized key of the type index set (`"battles"`).
    pub index_set: &'static str,
    /// Scalar attribute names stored directly in the flat entry.
    pub scalars: &'static [&'static str],
    /// Cache-visible associations, in encode order.
    pub associations: &'static [AssociationSchema],
    /// Fields populated out-of-band (separately keyed sets etc.), never
    /// written into the flat hash.
    pub custom: &'static [&'static str],
}

/// Classification of a single flat-entry key against a [`FieldSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind<'a> {
    /// Declared scalar attribute.
    Scalar,
    /// Encoded association subfield `<singular><index><subfield>`.
    Association {
        name: &'static str,
        index: usize,
        subfield: &'a str,
    },
    /// Declared custom field, read via extraneous cache calls.
    Custom,
    /// Not declared by the schema; skipped on read.
    Unknown,
}

impl FieldSchema {
    /// Cache key of the flat entry for one record.
    #[must_use]
    pub fn entry_key(&self, id: &str) -> String {
        format!("{}:{id}", self.type_name)
    }

    /// Look up a declared association by name.
    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationSchema> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Classify a flat-entry key into exactly one field bucket.
    ///
    /// Declared scalars and custom fields win over the positional match,
    /// so an unlucky scalar name like `sha1sum` stays a scalar as long
    /// as it is declared.
    #[must_use]
    pub fn classify<'a>(&self, key: &'a str) -> FieldKind<'a> {
        if self.scalars.contains(&key) {
            return FieldKind::Scalar;
        }
        if self.custom.contains(&key) {
            return FieldKind::Custom;
        }
        for assoc in self.associations {
            if let Some(rest) = key.strip_prefix(assoc.singular) {
                let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
                if digits == 0 || digits == rest.len() {
                    continue;
                }
                if let Ok(index) = rest[..digits].parse::<usize>() {
                    return FieldKind::Association {
                        name: assoc.name,
                        index,
                        subfield: &rest[digits..],
                    };
                }
            }
        }
        FieldKind::Unknown
    }
}

// =============================================================================
// CREATION INPUTS
// =============================================================================

/// One value in a form-style submission: either a plain field or a group
/// of nested sub-records keyed by positional index string
/// (`"video_attributes" => { "0" => {..}, "1" => {..} }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormField {
    Scalar(String),
    Nested(BTreeMap<String, SubFieldMap>),
}

/// Association name -> ordered nested sub-field maps, grouped for
/// creation. Ordering follows the numeric value of the submitted index
/// keys, not their lexical order.
pub type AssociationInput = HashMap<String, Vec<SubFieldMap>>;

/// Structured creation input for one record: top-level fields plus
/// grouped nested-association input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    pub fields: HashMap<String, String>,
    pub associations: AssociationInput,
}

impl RecordInput {
    /// Build a [`RecordInput`] from a flat form submission, pulling the
    /// `<singular>_attributes` groups out into [`AssociationInput`].
    ///
    /// Groups that do not correspond to a declared association are
    /// dropped. Index keys that fail to parse as numbers are dropped
    /// from their group.
    #[must_use]
    pub fn from_form(schema: &FieldSchema, form: HashMap<String, FormField>) -> Self {
        let mut input = Self::default();
        for (key, value) in form {
            match value {
                FormField::Scalar(v) => {
                    input.fields.insert(key, v);
                }
                FormField::Nested(groups) => {
                    let Some(assoc) = schema
                        .associations
                        .iter()
                        .find(|a| key == format!("{}_attributes", a.singular))
                    else {
                        continue;
                    };
                    let mut indexed: Vec<(usize, SubFieldMap)> = groups
                        .into_iter()
                        .filter_map(|(idx, fields)| Some((idx.parse().ok()?, fields)))
                        .collect();
                    indexed.sort_by_key(|(idx, _)| *idx);
                    input.associations.insert(
                        assoc.name.to_string(),
                        indexed.into_iter().map(|(_, fields)| fields).collect(),
                    );
                }
            }
        }
        input
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors surfaced by the primary-store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("invalid {type_name}: {field} {message}")]
    Validation {
        type_name: String,
        field: String,
        message: String,
    },

    #[error("record not found: {type_name} with id {id}")]
    NotFound { type_name: String, id: String },

    #[error("primary store error: {0}")]
    Store(String),
}
