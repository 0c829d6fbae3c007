//! Media ingestion pipeline
//!
//! One request moves through four fan-out stages, each finishing completely
//! before the next one starts:
//!
//! 1. **download** every source URL into a uniquely named local file
//! 2. **upload** every file to object storage
//! 3. **create** one child record per stored object, linked to the parent
//! 4. **link** the parent record to every child
//!
//! The first failing unit cancels its siblings and aborts the request. Nothing
//! in a failed request reaches the link stage, so the parent never references
//! an item that was not fully stored.
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = MediaPipeline::new(downloader, store, records, signer, config.pipeline);
//! let outcome = pipeline
//!     .ingest_attachments("rec1", "http://a.test/1.jpg,http://b.test/2.jpg", &cancel)
//!     .await?;
//! assert_eq!(outcome.children.len(), 2);
//! ```

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

pub mod create;
pub mod download;
pub mod error;
pub mod fanout;
pub mod link;
pub mod locator;
pub mod resolver;
pub mod types;
pub mod upload;

pub use download::{Downloader, HttpDownloader};
pub use error::{PipelineError, Stage};
pub use resolver::ScreenshotSigner;
pub use types::{
    ChildRecord, DownloadedItem, IngestionOutcome, IngestionRequest, SourceUrl, StoredAddress,
};

use crate::config::PipelineConfig;
use crate::records::RecordStore;
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct MediaPipeline {
    downloader: Arc<dyn Downloader>,
    store: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    signer: ScreenshotSigner,
    config: PipelineConfig,
}

impl MediaPipeline {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        store: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        signer: ScreenshotSigner,
        config: PipelineConfig,
    ) -> Self {
        Self {
            downloader,
            store,
            records,
            signer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Render `target` through the screenshot service and attach it to `parent_id`
    pub async fn ingest_screenshot(
        &self,
        parent_id: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestionOutcome, PipelineError> {
        let signed = self.signer.sign(target)?;
        let request = IngestionRequest::new(parent_id, vec![signed])?;
        self.ingest(request, cancel).await
    }

    /// Attach every URL of a comma-separated locator to `parent_id`
    pub async fn ingest_attachments(
        &self,
        parent_id: &str,
        locator: &str,
        cancel: &CancellationToken,
    ) -> Result<IngestionOutcome, PipelineError> {
        let request = IngestionRequest::from_locator(parent_id, locator)?;
        self.ingest(request, cancel).await
    }

    /// Run all four stages for one request
    #[instrument(
        skip(self, request, cancel),
        fields(parent_id = %request.parent_id, sources = request.sources.len())
    )]
    pub async fn ingest(
        &self,
        request: IngestionRequest,
        cancel: &CancellationToken,
    ) -> Result<IngestionOutcome, PipelineError> {
        let IngestionRequest { parent_id, sources } = request;
        let limit = self.config.max_concurrency;

        tokio::fs::create_dir_all(&self.config.download_dir)
            .await
            .map_err(|e| {
                PipelineError::Config(format!(
                    "Cannot create download directory {}: {}",
                    self.config.download_dir.display(),
                    e
                ))
            })?;

        let downloaded = download::download_all(
            &self.downloader,
            sources,
            &self.config.download_dir,
            limit,
            cancel,
        )
        .await?;
        info!(stage = %Stage::Download, count = downloaded.len(), "Stage complete");

        let addresses = upload::upload_all(&self.store, downloaded, limit, cancel).await?;
        info!(stage = %Stage::Upload, count = addresses.len(), "Stage complete");

        let children =
            create::create_all(&self.records, &parent_id, addresses, limit, cancel).await?;
        info!(stage = %Stage::CreateRecords, count = children.len(), "Stage complete");

        let patches_issued = link::link_all(
            &self.records,
            &parent_id,
            &children,
            self.config.link_mode,
            limit,
            cancel,
        )
        .await?;

        info!(children = children.len(), patches_issued, "Ingestion complete");

        Ok(IngestionOutcome {
            parent_id,
            children,
            patches_issued,
        })
    }
}
