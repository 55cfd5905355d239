//! Response joining
//!
//! Matches raw response documents to one survey and turns each usable
//! response into a spreadsheet row: submission time, coordinates, then one
//! column per declared question. A question with exactly one matching
//! answer gets its value; zero or several matches leave the column empty
//! for that row.

use log::warn;
use std::collections::HashMap;

use crate::api::document::FlattenedDocument;
use crate::api::value::FieldValue;
use crate::commands::export::surveys::Survey;

pub const TIME_HEADER: &str = "time";
pub const LAT_HEADER: &str = "lat";
pub const LON_HEADER: &str = "lon";

/// Join responses to `survey`, producing the ordered header list and one
/// row map per valid response.
///
/// Rows are keyed by question text. Two questions resolving to the same
/// text share a key, so the later question's answer shows under both
/// columns.
pub fn join_responses(
    raw_responses: &[FlattenedDocument],
    survey: &Survey,
) -> (Vec<String>, Vec<HashMap<String, String>>) {
    let mut headers = vec![
        TIME_HEADER.to_string(),
        LAT_HEADER.to_string(),
        LON_HEADER.to_string(),
    ];
    headers.extend(survey.questions.iter().map(|q| q.text.clone()));

    let mut rows = Vec::new();
    for response in raw_responses {
        if response.get_str("surveyId") != Some(survey.id.as_str()) {
            continue;
        }

        let Some(latitude) = response.get("coordinates.latitude") else {
            warn!("Response missing coordinate data: {}", response.id);
            continue;
        };
        let Some(longitude) = response.get("coordinates.longitude") else {
            warn!("Response missing coordinate data: {}", response.id);
            continue;
        };
        let Some(submitted) = response.get("submittedTs").and_then(|v| v.as_timestamp()) else {
            warn!("Response missing submission time: {}", response.id);
            continue;
        };

        let mut row = HashMap::new();
        row.insert(TIME_HEADER.to_string(), submitted.to_rfc3339());
        row.insert(LAT_HEADER.to_string(), latitude.to_string());
        row.insert(LON_HEADER.to_string(), longitude.to_string());

        let answers = response
            .get("responses")
            .and_then(|v| v.as_array())
            .unwrap_or(&[]);
        for question in &survey.questions {
            let matches: Vec<&FieldValue> = answers
                .iter()
                .filter(|answer| {
                    answer
                        .as_map()
                        .and_then(|map| map.get("questionId"))
                        .and_then(|id| id.as_str())
                        == Some(question.id.as_str())
                })
                .collect();
            // Exactly one match writes a value; zero or several leave the
            // column empty for this row.
            if matches.len() == 1 {
                if let Some(value) = matches[0].as_map().and_then(|map| map.get("response")) {
                    row.insert(question.text.clone(), value.to_string());
                }
            }
        }

        rows.push(row);
    }

    (headers, rows)
}
