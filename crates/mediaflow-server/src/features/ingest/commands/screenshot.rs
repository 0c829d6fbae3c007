//! Ingest a rendered screenshot of a web page
//!
//! The target page is rendered by the screenshot service; the resulting image
//! goes through the full pipeline as a single source.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_detached, IngestError};
use crate::pipeline::{IngestionOutcome, MediaPipeline};

/// Command to screenshot `url` and attach the image to record `id`
///
/// # Examples
///
/// ```rust,ignore
/// let command = IngestScreenshotCommand {
///     id: "recListing1".to_string(),
///     url: "https://listing.example.com/42".to_string(),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestScreenshotCommand {
    /// Parent record id
    pub id: String,

    /// Page to render
    pub url: String,
}

impl IngestScreenshotCommand {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.id.trim().is_empty() {
            return Err(IngestError::IdRequired);
        }
        if self.url.trim().is_empty() {
            return Err(IngestError::UrlRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pipeline, cancel), fields(parent_id = %command.id))]
pub async fn handle(
    pipeline: Arc<MediaPipeline>,
    cancel: CancellationToken,
    command: IngestScreenshotCommand,
) -> Result<IngestionOutcome, IngestError> {
    command.validate()?;

    tracing::info!(target_url = %command.url, "Ingesting screenshot");

    run_detached(async move {
        pipeline
            .ingest_screenshot(&command.id, &command.url, &cancel)
            .await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let command = IngestScreenshotCommand {
            id: "rec1".to_string(),
            url: "https://example.com".to_string(),
        };
        assert!(command.validate().is_ok());

        let missing_id = IngestScreenshotCommand {
            id: " ".to_string(),
            ..command.clone()
        };
        assert!(matches!(missing_id.validate(), Err(IngestError::IdRequired)));

        let missing_url = IngestScreenshotCommand {
            url: String::new(),
            ..command
        };
        assert!(matches!(missing_url.validate(), Err(IngestError::UrlRequired)));
    }

    #[test]
    fn test_deserialize() {
        let command: IngestScreenshotCommand =
            serde_json::from_str(r#"{"id":"rec1","url":"https://example.com"}"#).unwrap();
        assert_eq!(command.id, "rec1");
        assert_eq!(command.url, "https://example.com");
    }
}
