pub mod attachment;
pub mod screenshot;

pub use attachment::IngestAttachmentCommand;
pub use screenshot::IngestScreenshotCommand;

use std::future::Future;

use crate::pipeline::{IngestionOutcome, PipelineError};

/// Errors that can occur when handling an ingest command
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Record id is required and cannot be empty")]
    IdRequired,

    #[error("Source URL is required and cannot be empty")]
    UrlRequired,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Run an ingestion on its own task so a dropped HTTP connection does not
/// abort it partway through
pub(crate) async fn run_detached<F>(ingestion: F) -> Result<IngestionOutcome, IngestError>
where
    F: Future<Output = Result<IngestionOutcome, PipelineError>> + Send + 'static,
{
    match tokio::spawn(ingestion).await {
        Ok(result) => result.map_err(IngestError::from),
        Err(e) => Err(IngestError::Pipeline(PipelineError::Internal(format!(
            "Ingestion task failed: {}",
            e
        )))),
    }
}
