//! Values flowing between pipeline stages
//!
//! Every value carries `source_index`, the position of the URL it came from in
//! the original request, so results stay correlated with their sources across
//! stages that complete in arbitrary order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::error::PipelineError;
use super::locator::split_locator;

/// One source URL and its position in the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceUrl {
    pub index: usize,
    pub url: String,
}

/// One inbound trigger: a parent record and the media to attach to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionRequest {
    pub parent_id: String,
    pub sources: Vec<SourceUrl>,
}

impl IngestionRequest {
    pub fn new(parent_id: impl Into<String>, urls: Vec<String>) -> Result<Self, PipelineError> {
        let parent_id = parent_id.into();
        if parent_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "Parent record id is required".to_string(),
            ));
        }
        if urls.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "At least one source URL is required".to_string(),
            ));
        }

        let sources = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| SourceUrl { index, url })
            .collect();

        Ok(Self { parent_id, sources })
    }

    /// Build a request from a single URL or a comma-separated list
    pub fn from_locator(parent_id: impl Into<String>, locator: &str) -> Result<Self, PipelineError> {
        Self::new(parent_id, split_locator(locator)?)
    }
}

/// A source written to a uniquely named local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedItem {
    pub source_index: usize,
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub content_type: Option<String>,
}

/// Durable location of an uploaded item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAddress {
    pub source_index: usize,
    pub key: String,
    pub url: String,
}

/// Record created in the store for one stored item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRecord {
    pub source_index: usize,
    pub record_id: String,
    pub backing_address: StoredAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

/// Result of a completed ingestion, children in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionOutcome {
    pub parent_id: String,
    pub children: Vec<ChildRecord>,
    pub patches_issued: usize,
}

impl IngestionOutcome {
    pub fn record_ids(&self) -> Vec<String> {
        self.children.iter().map(|c| c.record_id.clone()).collect()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.children
            .iter()
            .map(|c| c.backing_address.url.clone())
            .collect()
    }
}
