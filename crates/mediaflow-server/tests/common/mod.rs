//! Shared harness for mediaflow integration tests
//!
//! Sources are served by a `wiremock` server and fetched with the real
//! `HttpDownloader`. Object storage and the record store are in-memory fakes
//! that record every call and can be told to fail.
//!
//! # Example
//!
//! ```rust,ignore
//! mod common;
//! use common::TestEnvironment;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let env = TestEnvironment::start(LinkMode::PerChild).await;
//!     let url = env.serve_image("/a.jpg").await;
//!     let outcome = env.pipeline().ingest_attachments("rec1", &url, &env.cancel).await.unwrap();
//! }
//! ```

#![allow(dead_code)]

use async_trait::async_trait;
use mediaflow_common::MediaError;
use mediaflow_server::config::{LinkMode, PipelineConfig, ScreenshotConfig};
use mediaflow_server::pipeline::{Downloader, HttpDownloader, MediaPipeline, ScreenshotSigner};
use mediaflow_server::records::{CreatedRecord, RecordStore};
use mediaflow_server::storage::ObjectStore;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One recorded `put_file` call
#[derive(Debug, Clone)]
pub struct PutCall {
    pub key: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

/// In-memory object store
#[derive(Default)]
pub struct FakeObjectStore {
    pub puts: Mutex<Vec<PutCall>>,
    /// Fail every put
    pub fail_all: bool,
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    fn object_key(&self, file_name: &str) -> String {
        format!("screenshots/{}", file_name)
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        _content_type: Option<&str>,
    ) -> mediaflow_common::Result<()> {
        if self.fail_all {
            return Err(MediaError::Storage("bucket unavailable".to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        self.puts.lock().unwrap().push(PutCall {
            key: key.to_string(),
            size,
            bytes,
        });
        Ok(())
    }

    fn durable_url(&self, key: &str) -> String {
        format!("https://s3.us-east-1.amazonaws.com/test-bucket/{}", key)
    }
}

impl FakeObjectStore {
    /// Store whose every put is rejected
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }
}

/// In-memory record store
#[derive(Default)]
pub struct FakeRecordStore {
    pub next_id: AtomicUsize,
    /// `(parent_id, attachment_url, record_id)`
    pub created: Mutex<Vec<(String, String, String)>>,
    /// `(parent_id, child_ids)`
    pub patches: Mutex<Vec<(String, Vec<String>)>>,
    pub fail_create: bool,
    pub fail_link: bool,
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn create_media_record(
        &self,
        parent_id: &str,
        attachment_url: &str,
    ) -> mediaflow_common::Result<CreatedRecord> {
        if self.fail_create {
            return Err(MediaError::RecordStore("HTTP 422 Unprocessable Entity".to_string()));
        }
        let id = format!("recMedia{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.created.lock().unwrap().push((
            parent_id.to_string(),
            attachment_url.to_string(),
            id.clone(),
        ));
        Ok(CreatedRecord {
            id,
            created_time: None,
        })
    }

    async fn link_children(
        &self,
        parent_id: &str,
        child_ids: &[String],
    ) -> mediaflow_common::Result<()> {
        if self.fail_link {
            return Err(MediaError::RecordStore("HTTP 404 Not Found".to_string()));
        }
        self.patches
            .lock()
            .unwrap()
            .push((parent_id.to_string(), child_ids.to_vec()));
        Ok(())
    }
}

impl FakeRecordStore {
    /// Store whose every create call is rejected
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Default::default()
        }
    }

    /// Store whose every parent update is rejected
    pub fn failing_link() -> Self {
        Self {
            fail_link: true,
            ..Default::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.lock().unwrap().len()
    }

    /// Every child id written onto `parent_id`, across all patches
    pub fn linked_ids(&self, parent_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .patches
            .lock()
            .unwrap()
            .iter()
            .filter(|(parent, _)| parent == parent_id)
            .flat_map(|(_, ids)| ids.clone())
            .collect();
        ids.sort();
        ids
    }
}

/// Fakes, a source server and a scratch download directory
pub struct TestEnvironment {
    pub server: MockServer,
    pub store: Arc<FakeObjectStore>,
    pub records: Arc<FakeRecordStore>,
    pub download_dir: TempDir,
    pub link_mode: LinkMode,
    pub screenshot: ScreenshotConfig,
    pub cancel: CancellationToken,
}

impl TestEnvironment {
    pub async fn start(link_mode: LinkMode) -> Self {
        Self::with_fakes(link_mode, FakeObjectStore::default(), FakeRecordStore::default()).await
    }

    pub async fn with_fakes(
        link_mode: LinkMode,
        store: FakeObjectStore,
        records: FakeRecordStore,
    ) -> Self {
        let server = MockServer::start().await;
        let screenshot = ScreenshotConfig {
            api_url: format!("{}/render/", server.uri()),
            api_key: "testkey".to_string(),
            secret: "testsecret".to_string(),
            delay_secs: 5,
        };

        Self {
            server,
            store: Arc::new(store),
            records: Arc::new(records),
            download_dir: TempDir::new().unwrap(),
            link_mode,
            screenshot,
            cancel: CancellationToken::new(),
        }
    }

    pub fn pipeline(&self) -> MediaPipeline {
        let downloader: Arc<dyn Downloader> =
            Arc::new(HttpDownloader::with_client(reqwest::Client::new()));

        MediaPipeline::new(
            downloader,
            self.store.clone(),
            self.records.clone(),
            ScreenshotSigner::new(self.screenshot.clone()),
            PipelineConfig {
                download_dir: self.download_dir.path().to_path_buf(),
                link_mode: self.link_mode,
                max_concurrency: None,
                http_timeout_secs: 10,
            },
        )
    }

    /// Serve `body` as a JPEG at `route`, returning its absolute URL
    pub async fn serve_bytes(&self, route: &str, body: Vec<u8>) -> String {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(body),
            )
            .mount(&self.server)
            .await;
        format!("{}{}", self.server.uri(), route)
    }

    pub async fn serve_image(&self, route: &str) -> String {
        self.serve_bytes(route, route.as_bytes().to_vec()).await
    }

    /// Answer `route` with `status`, returning its absolute URL
    pub async fn serve_status(&self, route: &str, status: u16) -> String {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
        format!("{}{}", self.server.uri(), route)
    }

    /// Number of files left in the download directory
    pub fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.download_dir.path()).unwrap().count()
    }
}
