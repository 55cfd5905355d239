//! Firestore field values
//!
//! The REST API wraps every field in a typed envelope ({"stringValue": ...},
//! {"mapValue": {"fields": ...}}, ...). This module decodes those envelopes
//! into a plain variant type the rest of the pipeline can work with.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

/// A decoded Firestore field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Full path of a referenced document, kept opaque.
    Reference(String),
    Array(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Decode a single REST value envelope.
    ///
    /// Geo points decode to a two-key map so they flatten like any other
    /// nested value. An envelope we don't recognize (e.g. bytesValue) aborts
    /// the run rather than silently dropping data.
    pub fn from_rest(json: &Json) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("Field value is not a JSON object: {}", json))?;
        let (kind, inner) = object
            .iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty field value envelope"))?;

        match kind.as_str() {
            "nullValue" => Ok(FieldValue::Null),
            "booleanValue" => {
                let b = inner
                    .as_bool()
                    .ok_or_else(|| anyhow::anyhow!("Invalid booleanValue: {}", inner))?;
                Ok(FieldValue::Bool(b))
            }
            // int64 fields arrive as JSON strings per the proto3 mapping,
            // but accept a bare number as well.
            "integerValue" => {
                let n = match inner {
                    Json::String(s) => s.parse::<i64>().ok(),
                    Json::Number(n) => n.as_i64(),
                    _ => None,
                };
                n.map(FieldValue::Integer)
                    .ok_or_else(|| anyhow::anyhow!("Invalid integerValue: {}", inner))
            }
            "doubleValue" => {
                let d = inner
                    .as_f64()
                    .ok_or_else(|| anyhow::anyhow!("Invalid doubleValue: {}", inner))?;
                Ok(FieldValue::Double(d))
            }
            "stringValue" => {
                let s = inner
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("Invalid stringValue: {}", inner))?;
                Ok(FieldValue::String(s.to_string()))
            }
            "timestampValue" => {
                let raw = inner
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestampValue: {}", inner))?;
                let ts = DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| anyhow::anyhow!("Invalid timestampValue '{}': {}", raw, e))?;
                Ok(FieldValue::Timestamp(ts.with_timezone(&Utc)))
            }
            "referenceValue" => {
                let path = inner
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("Invalid referenceValue: {}", inner))?;
                Ok(FieldValue::Reference(path.to_string()))
            }
            "geoPointValue" => {
                let mut map = BTreeMap::new();
                for key in ["latitude", "longitude"] {
                    let coord = inner.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
                    map.insert(key.to_string(), FieldValue::Double(coord));
                }
                Ok(FieldValue::Map(map))
            }
            "arrayValue" => {
                let mut items = Vec::new();
                if let Some(values) = inner.get("values").and_then(|v| v.as_array()) {
                    for value in values {
                        items.push(FieldValue::from_rest(value)?);
                    }
                }
                Ok(FieldValue::Array(items))
            }
            "mapValue" => {
                let fields = inner.get("fields").and_then(|f| f.as_object());
                Ok(FieldValue::Map(decode_field_map(fields)?))
            }
            other => anyhow::bail!("Unsupported Firestore value type: {}", other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

/// Decode a REST `fields` object into a value map.
pub fn decode_field_map(
    fields: Option<&serde_json::Map<String, Json>>,
) -> Result<BTreeMap<String, FieldValue>> {
    let mut map = BTreeMap::new();
    if let Some(fields) = fields {
        for (key, value) in fields {
            map.insert(key.clone(), FieldValue::from_rest(value)?);
        }
    }
    Ok(map)
}

/// String-cast used for spreadsheet cells. Whole doubles keep one decimal
/// place so coordinates render as "31.0" rather than "31".
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Double(d) => {
                if d.is_finite() && d.fract() == 0.0 {
                    write!(f, "{:.1}", d)
                } else {
                    write!(f, "{}", d)
                }
            }
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            FieldValue::Reference(path) => write!(f, "{}", path),
            FieldValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
