//! Google Drive upload client
//!
//! Uploads the finished workbook into a Drive folder using the v3 resumable
//! flow: a metadata POST opens an upload session, a single PUT sends the
//! file bytes and returns the created file's id.

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::{Value, json};
use std::path::Path;

use crate::auth::{Credentials, fetch_access_token};

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct DriveClient {
    client: reqwest::Client,
    credentials: Credentials,
    access_token: Option<String>,
}

impl DriveClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            access_token: None,
        }
    }

    /// Get or fetch the access token
    async fn get_access_token(&mut self) -> Result<String> {
        if self.access_token.is_none() {
            let token = fetch_access_token(&self.client, &self.credentials).await?;
            self.access_token = Some(token);
        }
        Ok(self.access_token.clone().unwrap())
    }

    /// Upload a local file into `folder_id` and return the new file id.
    pub async fn upload(&mut self, file_path: &Path, folder_id: &str) -> Result<String> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid upload path: {:?}", file_path))?;

        info!("Uploading {} to Drive folder {}", file_name, folder_id);

        let token = self.get_access_token().await?;
        let session_url = self.open_session(&token, file_name, folder_id).await?;
        debug!("Opened resumable upload session");

        let content = std::fs::read(file_path)
            .with_context(|| format!("Failed to read upload file: {:?}", file_path))?;

        let response = self
            .client
            .put(&session_url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", XLSX_MIME_TYPE)
            .body(content)
            .send()
            .await
            .context("Drive upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Drive upload failed with {}: {}", status, error_text);
        }

        let file: Value = response.json().await?;
        let file_id = file
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| anyhow::anyhow!("Drive upload response missing file id: {}", file))?;

        info!("Upload complete, file id {}", file_id);
        Ok(file_id.to_string())
    }

    async fn open_session(
        &self,
        token: &str,
        file_name: &str,
        folder_id: &str,
    ) -> Result<String> {
        let metadata = json!({
            "name": file_name,
            "parents": [folder_id],
        });

        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "resumable"), ("fields", "id")])
            .header("Authorization", format!("Bearer {}", token))
            .header("X-Upload-Content-Type", XLSX_MIME_TYPE)
            .json(&metadata)
            .send()
            .await
            .context("Failed to open Drive upload session")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Opening Drive upload session failed with {}: {}", status, error_text);
        }

        response
            .headers()
            .get("Location")
            .and_then(|l| l.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Drive upload session response missing Location header"))
    }
}
