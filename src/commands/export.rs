//! Export command
//!
//! One sequential run: read every subcollection under the versions
//! document, normalize the surveys, join each survey's responses, write the
//! workbook, upload it to Drive. Data-shape problems skip the affected
//! record; missing configuration aborts the run.

use anyhow::Result;
use chrono::Local;
use log::{debug, info};

pub mod responses;
pub mod surveys;
pub mod workbook;

use crate::api::{DriveClient, FirestoreClient};
use crate::auth::Credentials;
use crate::cli::ExportArgs;
use crate::config::Config;
use responses::join_responses;
use surveys::normalize_surveys;
use workbook::{SheetData, output_file_name, write_workbook};

const SURVEYS_COLLECTION: &str = "surveys";
const RESPONSES_COLLECTION: &str = "responses";

pub async fn run(args: ExportArgs) -> Result<()> {
    let config = Config::load()?;
    let document_path = args
        .document_path
        .unwrap_or_else(|| config.document_path.clone());

    let credentials = Credentials::load(&config.credentials_path)?;
    let project_id = config.project_id(credentials.project())?;

    let mut firestore = FirestoreClient::new(credentials.clone(), project_id);
    let data = firestore.read_subcollections(&document_path).await?;

    let empty = Vec::new();
    let raw_surveys = data.get(SURVEYS_COLLECTION).unwrap_or(&empty);
    let raw_responses = data.get(RESPONSES_COLLECTION).unwrap_or(&empty);
    info!(
        "Read {} surveys and {} responses",
        raw_surveys.len(),
        raw_responses.len()
    );

    let surveys = normalize_surveys(raw_surveys);

    let mut sheets = Vec::new();
    for survey in &surveys {
        let (headers, rows) = join_responses(raw_responses, survey);
        info!("Survey: {} ({})", survey.name, survey.description);
        info!("Headers: {}", headers.join(", "));
        info!("# Responses: {}", rows.len());
        if !rows.is_empty() {
            debug!("Sample row: {:?}", rows[0]);
            sheets.push(SheetData {
                survey_name: survey.name.clone(),
                headers,
                rows,
            });
        }
    }

    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());
    let file_name = output_file_name(&config.file_prefix, Local::now().date_naive());
    let output_path = output_dir.join(&file_name);

    write_workbook(&surveys, &sheets, &output_path)?;
    info!("Workbook written to {}", output_path.display());

    if args.skip_upload {
        println!("Workbook saved to: {}", output_path.display());
        return Ok(());
    }

    let folder_id = config.drive_folder_id()?;
    let mut drive = DriveClient::new(credentials);
    let file_id = drive.upload(&output_path, &folder_id).await?;
    println!("File ID: {}", file_id);

    Ok(())
}
