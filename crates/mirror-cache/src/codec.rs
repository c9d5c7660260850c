//! # Flattening Codec
//!
//! Converts a record's scalar attributes plus its declared associations
//! into a flat string map, and back. Nested records are encoded one
//! level deep as `<singular><index><subfield>` keys with dense,
//! zero-based indices per association.
//!
//! Absence rule: a scalar whose value is `None` is never written, so on
//! read its missing key decodes to unset rather than the empty string.
//!
//! Gap rule: decoding an association scans indices upward and stops at
//! the first index whose key subfield is missing. A gap therefore
//! truncates the reconstructed list; it is never skipped over.

use mirror_domain::{FieldKind, FieldSchema, FlatEntry, Plurality, SubFieldMap};

use crate::record::MirroredRecord;

/// Flatten a record into the entry stored under `"<type>:<id>"`.
///
/// Scalars first, then each declared association's encoding hook in
/// schema order. Associations not declared by the schema are invisible
/// here.
pub fn encode<R: MirroredRecord>(record: &R) -> FlatEntry {
    let mut entry = FlatEntry::new();
    for (name, value) in record.scalar_values() {
        if let Some(value) = value {
            entry.insert(name.to_string(), value);
        }
    }
    for assoc in R::schema().associations {
        record.encode_association(assoc.name, &mut entry);
    }
    entry
}

/// Emit one nested record's subfields at `<singular><index><subfield>`.
///
/// Helper for `encode_association` implementations; applies the same
/// absence rule as top-level scalars. One nesting level only - a nested
/// record's own associations are not encoded.
pub fn encode_nested(
    entry: &mut FlatEntry,
    singular: &str,
    index: usize,
    fields: Vec<(&str, Option<String>)>,
) {
    for (name, value) in fields {
        if let Some(value) = value {
            entry.insert(format!("{singular}{index}{name}"), value);
        }
    }
}

/// Keys of an entry that classify as scalars under the schema.
#[must_use]
pub fn scalar_fields<'a>(entry: &'a FlatEntry, schema: &FieldSchema) -> Vec<(&'a str, &'a str)> {
    entry
        .iter()
        .filter(|(key, _)| schema.classify(key) == FieldKind::Scalar)
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

/// Decode one association into ordered sub-field maps.
///
/// Index `i` counts as present when `<singular><i><key_subfield>` exists;
/// all keys classifying to that association and index are collected with
/// the prefix stripped. Scanning stops at the first absent index, and a
/// singular association reads index 0 only.
#[must_use]
pub fn decode_association(entry: &FlatEntry, schema: &FieldSchema, name: &str) -> Vec<SubFieldMap> {
    let Some(assoc) = schema.association(name) else {
        return Vec::new();
    };

    let mut nested = Vec::new();
    let mut index = 0;
    loop {
        let marker = format!("{}{index}{}", assoc.singular, assoc.key_subfield);
        if !entry.contains_key(&marker) {
            break;
        }

        let mut fields = SubFieldMap::new();
        for (key, value) in entry {
            if let FieldKind::Association {
                name: found,
                index: found_index,
                subfield,
            } = schema.classify(key)
            {
                if found == assoc.name && found_index == index {
                    fields.insert(subfield.to_string(), value.clone());
                }
            }
        }
        nested.push(fields);

        if assoc.plurality == Plurality::Singular {
            break;
        }
        index += 1;
    }
    nested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Battle, Video};

    fn finals() -> Battle {
        Battle {
            id: Some("42".to_string()),
            title: Some("Finals".to_string()),
            videos: vec![
                Video {
                    id: Some("1".to_string()),
                    url: Some("a".to_string()),
                },
                Video {
                    id: Some("2".to_string()),
                    url: Some("b".to_string()),
                },
            ],
            vote_ids: Vec::new(),
        }
    }

    #[test]
    fn battle_with_videos_flattens_to_indexed_keys() {
        let entry = encode(&finals());
        assert_eq!(entry["id"], "42");
        assert_eq!(entry["title"], "Finals");
        assert_eq!(entry["video0id"], "1");
        assert_eq!(entry["video0url"], "a");
        assert_eq!(entry["video1id"], "2");
        assert_eq!(entry["video1url"], "b");
        assert_eq!(entry.len(), 6);
    }

    #[test]
    fn absent_scalars_are_not_written() {
        let battle = Battle {
            id: Some("7".to_string()),
            title: None,
            videos: Vec::new(),
            vote_ids: Vec::new(),
        };
        let entry = encode(&battle);
        assert!(!entry.contains_key("title"));
        assert_eq!(entry.len(), 1);
    }

    #[test]
    fn round_trip_preserves_scalars_and_association_order() {
        let battle = finals();
        let entry = encode(&battle);

        let nested = decode_association(&entry, Battle::schema(), "videos");
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0]["id"], "1");
        assert_eq!(nested[0]["url"], "a");
        assert_eq!(nested[1]["id"], "2");
        assert_eq!(nested[1]["url"], "b");
    }

    #[test]
    fn index_gap_truncates_decoding() {
        let battle = Battle {
            videos: vec![
                Video {
                    id: Some("1".to_string()),
                    url: Some("a".to_string()),
                },
                Video {
                    id: Some("2".to_string()),
                    url: Some("b".to_string()),
                },
                Video {
                    id: Some("3".to_string()),
                    url: Some("c".to_string()),
                },
            ],
            ..finals()
        };
        let mut entry = encode(&battle);
        entry.remove("video1id");
        entry.remove("video1url");

        let nested = decode_association(&entry, Battle::schema(), "videos");
        // index 2 is still in the entry but never reached
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0]["id"], "1");
    }

    #[test]
    fn missing_key_subfield_ends_the_list() {
        let mut entry = encode(&finals());
        // url alone does not make index 1 present
        entry.remove("video1id");

        let nested = decode_association(&entry, Battle::schema(), "videos");
        assert_eq!(nested.len(), 1);
    }

    #[test]
    fn empty_association_decodes_empty() {
        let battle = Battle {
            videos: Vec::new(),
            ..finals()
        };
        let entry = encode(&battle);
        assert!(decode_association(&entry, Battle::schema(), "videos").is_empty());
    }

    #[test]
    fn scalar_fields_excludes_encoded_associations() {
        let entry = encode(&finals());
        let mut scalars = scalar_fields(&entry, Battle::schema());
        scalars.sort_unstable();
        assert_eq!(scalars, vec![("id", "42"), ("title", "Finals")]);
    }

    #[test]
    fn undeclared_association_decodes_empty() {
        let entry = encode(&finals());
        assert!(decode_association(&entry, Battle::schema(), "users").is_empty());
    }
}
