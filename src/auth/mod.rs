//! Google credential handling
//!
//! Loads the credentials file named by GOOGLE_APPLICATION_CREDENTIALS and
//! exchanges its refresh token for a bearer token. Both the Firestore and
//! Drive clients authenticate through this module.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Contents of an authorized-user credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading credentials from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {:?}", path))?;
        let credentials: Credentials = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {:?}", path))?;

        if credentials.credential_type != "authorized_user" {
            anyhow::bail!(
                "Unsupported credential type '{}' in {:?}: only 'authorized_user' credentials are supported",
                credentials.credential_type,
                path
            );
        }

        Ok(credentials)
    }

    /// Project the credentials are bound to, if the file names one.
    pub fn project(&self) -> Option<&str> {
        self.quota_project_id
            .as_deref()
            .or(self.project_id.as_deref())
    }
}

/// Exchange the refresh token for a short-lived access token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    credentials: &Credentials,
) -> Result<String> {
    info!("Requesting Google access token");

    let response = client
        .post(TOKEN_URL)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("refresh_token", &credentials.refresh_token),
        ])
        .send()
        .await
        .context("Token request failed")?;

    debug!("Token request status: {}", response.status());

    if response.status().is_success() {
        let token_data: Value = response.json().await?;
        if let Some(access_token) = token_data.get("access_token").and_then(|t| t.as_str()) {
            debug!("Access token obtained successfully");
            return Ok(access_token.to_string());
        }
        anyhow::bail!("Authentication failed: no access token in response");
    } else {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        anyhow::bail!("Authentication failed: {}", error_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_credentials(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_authorized_user_credentials() {
        let file = write_credentials(
            r#"{
                "type": "authorized_user",
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "token",
                "quota_project_id": "negev-prod"
            }"#,
        );

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.client_id, "id");
        assert_eq!(credentials.project(), Some("negev-prod"));
    }

    #[test]
    fn test_service_account_credentials_are_rejected() {
        let file = write_credentials(
            r#"{
                "type": "service_account",
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "token"
            }"#,
        );

        let err = Credentials::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported credential type"));
    }

    #[test]
    fn test_missing_credentials_file() {
        let err = Credentials::load(Path::new("/nonexistent/creds.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read credentials file"));
    }
}
