//! Document records and flattening
//!
//! Survey and response documents arrive as nested field maps. The pipeline
//! works on a flat view where nesting is encoded in dotted key paths
//! ("coordinates.latitude"), with the document id carried alongside.

use crate::api::value::FieldValue;
use std::collections::BTreeMap;

/// A raw document as read from a subcollection.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

/// A document with all nested maps collapsed into dotted key paths.
///
/// Invariant: no value in `fields` is a `FieldValue::Map`. Arrays and other
/// non-map values pass through unchanged.
#[derive(Debug, Clone)]
pub struct FlattenedDocument {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl FlattenedDocument {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Flatten one document, joining nested map keys with ".".
pub fn flatten_document(document: &Document) -> FlattenedDocument {
    let mut fields = BTreeMap::new();
    flatten_into("", &document.fields, &mut fields);
    FlattenedDocument {
        id: document.id.clone(),
        fields,
    }
}

fn flatten_into(
    prefix: &str,
    source: &BTreeMap<String, FieldValue>,
    out: &mut BTreeMap<String, FieldValue>,
) {
    for (key, value) in source {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            FieldValue::Map(inner) => flatten_into(&path, inner, out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, FieldValue)>) -> BTreeMap<String, FieldValue> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_flatten_nested_maps() {
        let document = Document {
            id: "r1".to_string(),
            fields: map(vec![
                (
                    "coordinates",
                    FieldValue::Map(map(vec![
                        ("latitude", FieldValue::Double(31.0)),
                        ("longitude", FieldValue::Double(34.0)),
                    ])),
                ),
                ("surveyId", FieldValue::String("s1".to_string())),
            ]),
        };

        let flat = flatten_document(&document);

        assert_eq!(flat.id, "r1");
        assert_eq!(
            flat.get("coordinates.latitude"),
            Some(&FieldValue::Double(31.0))
        );
        assert_eq!(
            flat.get("coordinates.longitude"),
            Some(&FieldValue::Double(34.0))
        );
        assert_eq!(flat.get_str("surveyId"), Some("s1"));
        assert!(flat.get("coordinates").is_none());
    }

    #[test]
    fn test_flatten_depth_is_associative() {
        // a.b.c must come out identical whether the nesting is 2+1 or 1+2.
        let deep_first = Document {
            id: "d".to_string(),
            fields: map(vec![(
                "a",
                FieldValue::Map(map(vec![(
                    "b",
                    FieldValue::Map(map(vec![("c", FieldValue::Integer(1))])),
                )])),
            )]),
        };
        let flat = flatten_document(&deep_first);
        assert_eq!(flat.get("a.b.c"), Some(&FieldValue::Integer(1)));
        assert_eq!(flat.fields.len(), 1);
    }

    #[test]
    fn test_flatten_never_leaves_a_map() {
        let document = Document {
            id: "d".to_string(),
            fields: map(vec![
                (
                    "name",
                    FieldValue::Map(map(vec![(
                        "he",
                        FieldValue::String("סקר".to_string()),
                    )])),
                ),
                ("count", FieldValue::Integer(3)),
            ]),
        };
        let flat = flatten_document(&document);
        assert!(
            flat.fields
                .values()
                .all(|v| !matches!(v, FieldValue::Map(_)))
        );
    }

    #[test]
    fn test_flatten_flat_document_is_identity() {
        let fields = map(vec![
            ("surveyId", FieldValue::String("s1".to_string())),
            ("count", FieldValue::Integer(2)),
        ]);
        let document = Document {
            id: "r1".to_string(),
            fields: fields.clone(),
        };
        let flat = flatten_document(&document);
        assert_eq!(flat.fields, fields);
        assert_eq!(flat.id, "r1");
    }

    #[test]
    fn test_arrays_pass_through_opaque() {
        let answers = FieldValue::Array(vec![FieldValue::Map(map(vec![
            ("questionId", FieldValue::String("q1".to_string())),
            ("response", FieldValue::String("כן".to_string())),
        ]))]);
        let document = Document {
            id: "r1".to_string(),
            fields: map(vec![("responses", answers.clone())]),
        };
        let flat = flatten_document(&document);
        assert_eq!(flat.get("responses"), Some(&answers));
    }
}
