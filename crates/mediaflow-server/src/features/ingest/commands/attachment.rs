//! Ingest one or more files already hosted elsewhere

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{run_detached, IngestError};
use crate::pipeline::{IngestionOutcome, MediaPipeline};

/// Command to attach every file in `download_url` to record `id`
///
/// `download_url` is a single URL or a comma-separated list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAttachmentCommand {
    /// Parent record id
    pub id: String,

    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

impl IngestAttachmentCommand {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.id.trim().is_empty() {
            return Err(IngestError::IdRequired);
        }
        if self.download_url.trim().is_empty() {
            return Err(IngestError::UrlRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pipeline, cancel), fields(parent_id = %command.id))]
pub async fn handle(
    pipeline: Arc<MediaPipeline>,
    cancel: CancellationToken,
    command: IngestAttachmentCommand,
) -> Result<IngestionOutcome, IngestError> {
    command.validate()?;

    tracing::info!(locator = %command.download_url, "Ingesting attachments");

    run_detached(async move {
        pipeline
            .ingest_attachments(&command.id, &command.download_url, &cancel)
            .await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_field() {
        let command: IngestAttachmentCommand = serde_json::from_str(
            r#"{"id":"rec1","downloadUrl":"http://a.test,http://b.test"}"#,
        )
        .unwrap();
        assert_eq!(command.download_url, "http://a.test,http://b.test");
        assert!(command.validate().is_ok());
    }

    #[test]
    fn test_snake_case_field_is_rejected() {
        let result = serde_json::from_str::<IngestAttachmentCommand>(
            r#"{"id":"rec1","download_url":"http://a.test"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_locator() {
        let command = IngestAttachmentCommand {
            id: "rec1".to_string(),
            download_url: "  ".to_string(),
        };
        assert!(matches!(command.validate(), Err(IngestError::UrlRequired)));
    }
}
