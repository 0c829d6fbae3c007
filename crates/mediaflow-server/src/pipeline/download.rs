//! Download stage: fetch every source URL into a uniquely named local file

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use mediaflow_common::MediaError;
use reqwest::{header::CONTENT_TYPE, Client};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::error::{PipelineError, Stage};
use super::fanout::{fan_out, CancelMode};
use super::types::{DownloadedItem, SourceUrl};

/// Fetches one source into a fresh file under `dir`
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, source: &SourceUrl, dir: &Path) -> mediaflow_common::Result<DownloadedItem>;
}

#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mediaflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build download HTTP client")?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[instrument(skip(self, dir), fields(index = source.index, url = %source.url))]
    async fn download(&self, source: &SourceUrl, dir: &Path) -> mediaflow_common::Result<DownloadedItem> {
        let response = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| MediaError::Network(format!("GET {} failed: {}", source.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Network(format!(
                "GET {} returned HTTP {}",
                source.url, status
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let file_name = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_for(content_type.as_deref())
        );
        let path = dir.join(&file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        let mut guard = PartialFile::new(path.clone());

        let mut size = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                MediaError::Network(format!("Reading body of {} failed: {}", source.url, e))
            })?;
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        guard.keep();

        debug!(file = %file_name, size, "Source downloaded");

        Ok(DownloadedItem {
            source_index: source.index,
            path,
            file_name,
            size,
            content_type,
        })
    }
}

/// Removes a file on drop unless it was completed
struct PartialFile {
    path: PathBuf,
    keep: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.keep {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Failed to remove partial download");
                }
            }
        }
    }
}

/// File extension for a response `Content-Type`, `jpg` when unknown
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let Some(parsed) = content_type.and_then(|value| value.parse::<mime::Mime>().ok()) else {
        return "jpg";
    };

    if parsed.type_() != mime::IMAGE {
        return "jpg";
    }

    match parsed.subtype().as_str() {
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        _ => "jpg",
    }
}

/// Best-effort removal of local files; missing files are ignored
pub async fn remove_local_files(items: &[DownloadedItem]) {
    for item in items {
        match tokio::fs::remove_file(&item.path).await {
            Ok(()) => debug!(path = %item.path.display(), "Removed local file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {},
            Err(e) => warn!(path = %item.path.display(), error = %e, "Failed to remove local file"),
        }
    }
}

/// Download every source concurrently into `dir`
///
/// On failure, files fetched by units that did finish are removed before the
/// error is returned.
pub async fn download_all(
    downloader: &Arc<dyn Downloader>,
    sources: Vec<SourceUrl>,
    dir: &Path,
    max_concurrency: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<DownloadedItem>, PipelineError> {
    // Nothing leaves this host during a download, so in-flight units can be
    // dropped; `PartialFile` removes whatever they had written
    let result = fan_out(
        Stage::Download,
        sources,
        max_concurrency,
        CancelMode::Interrupt,
        cancel,
        |source| {
            let downloader = Arc::clone(downloader);
            let dir = dir.to_path_buf();
            async move { downloader.download(&source, &dir).await }
        },
    )
    .await;

    match result {
        Ok(items) => Ok(items),
        Err(failure) => {
            remove_local_files(&failure.completed).await;
            Err(failure.error)
        },
    }
}
