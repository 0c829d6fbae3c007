//! Airtable-compatible REST client

use anyhow::{Context, Result};
use async_trait::async_trait;
use mediaflow_common::MediaError;
use reqwest::{Client, Response};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

use super::config::RecordStoreConfig;
use super::types::{CreatedRecord, RecordsResponse};
use super::RecordStore;

/// Longest slice of an error body carried into error messages
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    config: RecordStoreConfig,
}

impl AirtableClient {
    pub fn new(config: RecordStoreConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mediaflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build record store HTTP client")?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: RecordStoreConfig) -> Self {
        Self { client, config }
    }

    /// `{records:[{fields:{File:[{url}], Link: url, Listings:[parentId]}}]}`
    pub fn media_payload(&self, parent_id: &str, attachment_url: &str) -> Value {
        let mut fields = Map::new();
        fields.insert(
            self.config.attachment_field.clone(),
            json!([{ "url": attachment_url }]),
        );
        if let Some(link_field) = &self.config.link_field {
            fields.insert(link_field.clone(), json!(attachment_url));
        }
        fields.insert(self.config.parent_link_field.clone(), json!([parent_id]));

        json!({ "records": [{ "fields": fields }] })
    }

    /// `{records:[{id: parentId, fields:{Images:[childId, ...]}}]}`
    pub fn link_payload(&self, parent_id: &str, child_ids: &[String]) -> Value {
        let mut fields = Map::new();
        fields.insert(self.config.children_field.clone(), json!(child_ids));

        json!({ "records": [{ "id": parent_id, "fields": fields }] })
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    #[instrument(skip(self), fields(table = %self.config.media_table))]
    async fn create_media_record(
        &self,
        parent_id: &str,
        attachment_url: &str,
    ) -> mediaflow_common::Result<CreatedRecord> {
        let url = self.config.table_url(&self.config.media_table);
        let payload = self.media_payload(parent_id, attachment_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MediaError::Network(format!("POST {} failed: {}", url, e)))?;

        let response = ensure_success(response, "create").await?;

        let body: RecordsResponse = response.json().await.map_err(|e| {
            MediaError::RecordStore(format!("Invalid create response from {}: {}", url, e))
        })?;

        let record = body.records.into_iter().next().ok_or_else(|| {
            MediaError::RecordStore("Create response contained no records".to_string())
        })?;

        debug!(record_id = %record.id, "Created media record");

        Ok(record.into())
    }

    #[instrument(skip(self), fields(table = %self.config.parent_table, children = child_ids.len()))]
    async fn link_children(
        &self,
        parent_id: &str,
        child_ids: &[String],
    ) -> mediaflow_common::Result<()> {
        let url = self.config.table_url(&self.config.parent_table);
        let payload = self.link_payload(parent_id, child_ids);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MediaError::Network(format!("PATCH {} failed: {}", url, e)))?;

        ensure_success(response, "update").await?;

        debug!("Updated parent record");

        Ok(())
    }
}

/// Turn a non-2xx response into a record store error carrying the status and body
async fn ensure_success(response: Response, operation: &str) -> mediaflow_common::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }

    Err(MediaError::RecordStore(format!(
        "Record {} rejected with HTTP {}: {}",
        operation, status, body
    )))
}
