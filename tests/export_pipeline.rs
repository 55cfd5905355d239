//! End-to-end pipeline tests
//!
//! Drives decode -> flatten -> normalize -> join -> workbook assembly from
//! raw REST-shaped fixtures, without touching the network.

use serde_json::json;

use yallanegev_export::api::document::{Document, FlattenedDocument, flatten_document};
use yallanegev_export::api::value::decode_field_map;
use yallanegev_export::commands::export::responses::join_responses;
use yallanegev_export::commands::export::surveys::normalize_surveys;
use yallanegev_export::commands::export::workbook::{
    Cell, SheetData, build_detail_grid, build_summary_grid, write_workbook,
};

/// Decode a REST `fields` object and flatten it into a document.
fn document(id: &str, fields: serde_json::Value) -> FlattenedDocument {
    let fields = decode_field_map(fields.as_object()).unwrap();
    flatten_document(&Document {
        id: id.to_string(),
        fields,
    })
}

fn survey_fixture() -> FlattenedDocument {
    document(
        "s1",
        json!({
            "name": {"mapValue": {"fields": {
                "he": {"stringValue": "סקר"},
                "en": {"stringValue": "Survey"}
            }}},
            "description": {"mapValue": {"fields": {
                "he": {"stringValue": "סקר הנגב"}
            }}},
            "creationDateTime": {"timestampValue": "2024-03-01T10:00:00Z"},
            "questions": {"arrayValue": {"values": [
                {"mapValue": {"fields": {
                    "id": {"stringValue": "q1"},
                    "text": {"mapValue": {"fields": {
                        "he": {"stringValue": "שאלה"}
                    }}}
                }}}
            ]}}
        }),
    )
}

fn response_fixture() -> FlattenedDocument {
    document(
        "r1",
        json!({
            "surveyId": {"stringValue": "s1"},
            "submittedTs": {"timestampValue": "2024-03-02T08:30:00Z"},
            "coordinates": {"mapValue": {"fields": {
                "latitude": {"doubleValue": 31.0},
                "longitude": {"doubleValue": 34.0}
            }}},
            "responses": {"arrayValue": {"values": [
                {"mapValue": {"fields": {
                    "questionId": {"stringValue": "q1"},
                    "response": {"stringValue": "כן"}
                }}}
            ]}}
        }),
    )
}

#[test]
fn test_full_pipeline_produces_one_sheet() {
    let surveys = normalize_surveys(&[survey_fixture()]);
    assert_eq!(surveys.len(), 1);
    let survey = &surveys[0];
    assert_eq!(survey.name, "סקר");
    assert_eq!(survey.description, "סקר הנגב");

    let (headers, rows) = join_responses(&[response_fixture()], survey);
    assert_eq!(headers, vec!["time", "lat", "lon", "שאלה"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("time").unwrap(), "2024-03-02T08:30:00+00:00");
    assert_eq!(rows[0].get("lat").unwrap(), "31.0");
    assert_eq!(rows[0].get("lon").unwrap(), "34.0");
    assert_eq!(rows[0].get("שאלה").unwrap(), "כן");

    let sheet = SheetData {
        survey_name: survey.name.clone(),
        headers,
        rows,
    };
    let grid = build_detail_grid(&sheet);
    assert_eq!(grid.len(), 2);
    assert_eq!(grid[1][3], Cell::Text("כן".to_string()));

    let summary = build_summary_grid(&surveys, &[sheet]);
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[1][0], Cell::Text("סקר".to_string()));
    assert_eq!(summary[1][4], Cell::Number(1.0));
}

#[test]
fn test_response_without_latitude_keeps_survey_in_summary() {
    let no_coordinates = document(
        "r2",
        json!({
            "surveyId": {"stringValue": "s1"},
            "submittedTs": {"timestampValue": "2024-03-02T08:30:00Z"},
            "responses": {"arrayValue": {"values": []}}
        }),
    );

    let surveys = normalize_surveys(&[survey_fixture()]);
    let (_, rows) = join_responses(&[no_coordinates], &surveys[0]);
    assert!(rows.is_empty());

    // No sheet is collected, but the survey still shows in the summary
    // with a zero response count.
    let summary = build_summary_grid(&surveys, &[]);
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[1][4], Cell::Number(0.0));
}

#[test]
fn test_english_fallback_name_is_exported() {
    let survey = document(
        "s2",
        json!({
            "name": {"mapValue": {"fields": {
                "he": {"stringValue": ""},
                "en": {"stringValue": "Survey"}
            }}},
            "creationDateTime": {"timestampValue": "2024-03-01T10:00:00Z"},
            "questions": {"arrayValue": {"values": [
                {"mapValue": {"fields": {
                    "id": {"stringValue": "q1"},
                    "text": {"mapValue": {"fields": {
                        "en": {"stringValue": "Question"}
                    }}}
                }}}
            ]}}
        }),
    );

    let surveys = normalize_surveys(&[survey]);
    assert_eq!(surveys.len(), 1);
    assert_eq!(surveys[0].name, "Survey");
    assert_eq!(surveys[0].questions[0].text, "Question");
}

#[test]
fn test_workbook_round_trip_to_disk() {
    let surveys = normalize_surveys(&[survey_fixture()]);
    let (headers, rows) = join_responses(&[response_fixture()], &surveys[0]);
    let sheets = vec![SheetData {
        survey_name: surveys[0].name.clone(),
        headers,
        rows,
    }];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("yallanegev-2024-03-02.xlsx");
    write_workbook(&surveys, &sheets, &path).unwrap();

    assert!(path.exists());
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}
