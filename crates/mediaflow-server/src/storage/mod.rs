//! Object storage for uploaded media
//!
//! The pipeline only needs "put a local file under a key" and "tell me the
//! durable address of that key", so storage is consumed through the
//! [`ObjectStore`] trait. [`S3Store`] is the production implementation.

use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use mediaflow_common::MediaError;
use std::path::Path;
use tracing::{debug, info, instrument};

pub mod config;

use config::StorageConfig;

/// Durable blob storage consumed by the upload stage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Key under which a downloaded file with `file_name` is stored
    fn object_key(&self, file_name: &str) -> String;

    /// Upload the full contents of `path` under `key`
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        content_type: Option<&str>,
    ) -> mediaflow_common::Result<()>;

    /// Externally dereferenceable address of `key`
    fn durable_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: StorageConfig,
}

impl S3Store {
    pub async fn new(config: StorageConfig) -> Result<Self> {
        debug!("Initializing storage with config: {:?}", config);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "mediaflow-storage",
            ));
        }

        let shared = loader.load().await;
        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(bucket = %config.bucket, region = %config.region, "Storage client initialized");

        Ok(Self { client, config })
    }

    pub fn from_client(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn object_key(&self, file_name: &str) -> String {
        self.config.object_key(file_name)
    }

    #[instrument(skip(self, path), fields(bucket = %self.config.bucket))]
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        size: u64,
        content_type: Option<&str>,
    ) -> mediaflow_common::Result<()> {
        debug!("Uploading {} bytes to s3://{}/{}", size, self.config.bucket, key);

        let body = ByteStream::from_path(path).await.map_err(|e| {
            MediaError::Storage(format!("Failed to open {} for upload: {}", path.display(), e))
        })?;

        let content_length = i64::try_from(size)
            .map_err(|_| MediaError::Storage(format!("File too large to upload: {} bytes", size)))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body)
            .content_length(content_length);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| {
            MediaError::Storage(format!(
                "Failed to upload to s3://{}/{}: {}",
                self.config.bucket,
                key,
                DisplayErrorContext(&e)
            ))
        })?;

        info!("Successfully uploaded to s3://{}/{}", self.config.bucket, key);

        Ok(())
    }

    fn durable_url(&self, key: &str) -> String {
        self.config.durable_url(key)
    }
}
