//! Firestore REST client
//!
//! Reads all immediate subcollections of one parent document. The export
//! only needs "read everything under this document", so the client exposes
//! exactly that: list the subcollection ids, then stream each
//! subcollection's documents, page by page.

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::{Value, json};
use std::collections::HashMap;

use crate::api::document::{Document, FlattenedDocument, flatten_document};
use crate::api::value::decode_field_map;
use crate::auth::{Credentials, fetch_access_token};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

pub struct FirestoreClient {
    client: reqwest::Client,
    credentials: Credentials,
    project_id: String,
    access_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(credentials: Credentials, project_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            project_id,
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

    fn documents_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            FIRESTORE_BASE_URL, self.project_id, path
        )
    }

    /// Read all immediate subcollections of `document_path` into flattened
    /// documents, keyed by subcollection name.
    pub async fn read_subcollections(
        &mut self,
        document_path: &str,
    ) -> Result<HashMap<String, Vec<FlattenedDocument>>> {
        info!("Reading subcollections of document: {}", document_path);

        let mut all_data = HashMap::new();
        for collection in self.list_collection_ids(document_path).await? {
            let documents = self.list_documents(document_path, &collection).await?;
            debug!("Collection '{}': {} documents", collection, documents.len());
            all_data.insert(collection, documents);
        }
        Ok(all_data)
    }

    async fn list_collection_ids(&mut self, document_path: &str) -> Result<Vec<String>> {
        let token = self.get_access_token().await?;
        let url = format!("{}:listCollectionIds", self.documents_url(document_path));

        let mut collection_ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut body = json!({ "pageSize": PAGE_SIZE });
            if let Some(ref token_value) = page_token {
                body["pageToken"] = json!(token_value);
            }

            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", token))
                .json(&body)
                .send()
                .await
                .with_context(|| format!("Failed to list subcollections of {}", document_path))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                anyhow::bail!(
                    "Listing subcollections of {} failed with {}: {}",
                    document_path,
                    status,
                    error_text
                );
            }

            let page: Value = response.json().await?;
            if let Some(ids) = page.get("collectionIds").and_then(|v| v.as_array()) {
                for id in ids {
                    if let Some(id) = id.as_str() {
                        collection_ids.push(id.to_string());
                    }
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(|t| t.as_str())
                .map(|s| s.to_string());
            if page_token.is_none() {
                break;
            }
        }

        debug!(
            "Document {} has {} subcollections",
            document_path,
            collection_ids.len()
        );
        Ok(collection_ids)
    }

    async fn list_documents(
        &mut self,
        document_path: &str,
        collection: &str,
    ) -> Result<Vec<FlattenedDocument>> {
        let token = self.get_access_token().await?;
        let url = format!("{}/{}", self.documents_url(document_path), collection);

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(ref token_value) = page_token {
                request = request.query(&[("pageToken", token_value)]);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to read collection {}", collection))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                anyhow::bail!(
                    "Reading collection {} failed with {}: {}",
                    collection,
                    status,
                    error_text
                );
            }

            let page: Value = response.json().await?;
            if let Some(items) = page.get("documents").and_then(|v| v.as_array()) {
                for item in items {
                    documents.push(decode_document(item)?);
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(|t| t.as_str())
                .map(|s| s.to_string());
            if page_token.is_none() {
                break;
            }
        }

        Ok(documents)
    }
}

/// Decode one REST document resource and flatten it.
fn decode_document(json: &Value) -> Result<FlattenedDocument> {
    let name = json
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| anyhow::anyhow!("Document resource missing 'name': {}", json))?;
    // The resource name is the full path; the document id is its last segment.
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = decode_field_map(json.get("fields").and_then(|f| f.as_object()))
        .with_context(|| format!("Failed to decode document {}", id))?;

    Ok(flatten_document(&Document { id, fields }))
}
