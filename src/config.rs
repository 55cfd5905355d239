use anyhow::{Context, Result};
use log::debug;
use std::env;
use std::path::PathBuf;

const DEFAULT_DOCUMENT_PATH: &str = "versions/v1";
const DEFAULT_FILE_PREFIX: &str = "yallanegev";

/// Run configuration, sourced from the environment (a `.env` file is
/// honored via dotenvy in main).
///
/// The credentials path is required up front since the Firestore read is the
/// first thing the run does. The Drive folder id is only resolved when the
/// upload happens, so a missing folder id fails after the workbook has been
/// written locally.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials_path: PathBuf,
    pub document_path: String,
    pub file_prefix: String,
    pub output_dir: PathBuf,
    project_id: Option<String>,
    drive_folder: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let credentials_path = env::var("GOOGLE_APPLICATION_CREDENTIALS")
            .map(PathBuf::from)
            .context("GOOGLE_APPLICATION_CREDENTIALS environment variable is not set")?;

        let config = Self {
            credentials_path,
            document_path: env::var("FIRESTORE_DOCUMENT_PATH")
                .unwrap_or_else(|_| DEFAULT_DOCUMENT_PATH.to_string()),
            file_prefix: env::var("EXPORT_FILE_PREFIX")
                .unwrap_or_else(|_| DEFAULT_FILE_PREFIX.to_string()),
            output_dir: env::var("EXPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            project_id: env::var("FIRESTORE_PROJECT_ID").ok(),
            drive_folder: env::var("DRIVE_FOLDER_ID").ok(),
        };

        debug!(
            "Loaded config: document_path={}, prefix={}",
            config.document_path, config.file_prefix
        );
        Ok(config)
    }

    /// Project the Firestore reads run against: the explicit override, or
    /// whatever project the credentials file names.
    pub fn project_id(&self, credentials_project: Option<&str>) -> Result<String> {
        self.project_id
            .as_deref()
            .or(credentials_project)
            .map(|p| p.to_string())
            .context(
                "No project id available: set FIRESTORE_PROJECT_ID or use credentials bound to a project",
            )
    }

    /// Target Drive folder. A full folder URL is accepted; only the last
    /// path segment is used.
    pub fn drive_folder_id(&self) -> Result<String> {
        let raw = self
            .drive_folder
            .as_deref()
            .context("DRIVE_FOLDER_ID environment variable is not set")?;
        folder_id_from(raw).context("DRIVE_FOLDER_ID is empty")
    }
}

fn folder_id_from(raw: &str) -> Option<String> {
    let id = raw.trim().rsplit('/').next().unwrap_or("").to_string();
    if id.is_empty() { None } else { Some(id) }
}
