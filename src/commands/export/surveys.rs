//! Survey normalization
//!
//! Raw survey documents carry localized name/description/question text in
//! `he`/`en` pairs. Normalization resolves those to plain strings (Hebrew
//! preferred, English fallback) and drops surveys that can't be exported:
//! no usable name, or no usable questions.

use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::api::document::FlattenedDocument;
use crate::api::value::FieldValue;

#[derive(Debug, Clone)]
pub struct Survey {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    pub text: String,
}

/// Hebrew-first resolution: the `he` value when present and non-empty,
/// otherwise the `en` value, otherwise empty. Never fails on missing keys.
pub fn resolve_localized(he: Option<&str>, en: Option<&str>) -> String {
    match he {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => en.unwrap_or("").to_string(),
    }
}

fn localized_field(document: &FlattenedDocument, key: &str) -> String {
    resolve_localized(
        document.get_str(&format!("{}.he", key)),
        document.get_str(&format!("{}.en", key)),
    )
}

fn localized_map_entry(map: &BTreeMap<String, FieldValue>, key: &str) -> String {
    let text = map.get(key).and_then(|v| v.as_map());
    resolve_localized(
        text.and_then(|t| t.get("he")).and_then(|v| v.as_str()),
        text.and_then(|t| t.get("en")).and_then(|v| v.as_str()),
    )
}

/// Normalize raw survey documents, in input order. Surveys that resolve to
/// an empty name or an empty question list are left out; that is expected
/// data shape, not an error.
pub fn normalize_surveys(raw_surveys: &[FlattenedDocument]) -> Vec<Survey> {
    let mut surveys = Vec::new();

    for raw in raw_surveys {
        let name = localized_field(raw, "name");
        if name.is_empty() {
            debug!("Survey {} has no resolvable name, skipping", raw.id);
            continue;
        }
        let description = localized_field(raw, "description");

        let questions = normalize_questions(raw);
        if questions.is_empty() {
            debug!("Survey {} has no usable questions, skipping", raw.id);
            continue;
        }

        let created_at = match raw.get("creationDateTime").and_then(|v| v.as_timestamp()) {
            Some(ts) => ts.to_rfc3339(),
            None => {
                warn!("Survey {} has no usable creationDateTime, skipping", raw.id);
                continue;
            }
        };

        info!(
            "Processing survey: {} ({}), with {} questions",
            name,
            description,
            questions.len()
        );

        surveys.push(Survey {
            id: raw.id.clone(),
            name,
            description,
            created_at,
            questions,
        });
    }

    surveys
}

fn normalize_questions(raw: &FlattenedDocument) -> Vec<Question> {
    let mut questions = Vec::new();
    let Some(items) = raw.get("questions").and_then(|v| v.as_array()) else {
        return questions;
    };

    for item in items {
        let Some(map) = item.as_map() else {
            continue;
        };
        let id = map.get("id").and_then(|v| v.as_str());
        let text = localized_map_entry(map, "text");
        match id {
            Some(id) if !text.is_empty() => questions.push(Question {
                id: id.to_string(),
                text,
            }),
            _ => debug!("Survey {}: question without id or text, skipping", raw.id),
        }
    }

    questions
}
