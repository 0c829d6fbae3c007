//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::records::config::RecordStoreConfig;
use crate::storage::config::StorageConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Rendering delay passed to the screenshot service.
pub const DEFAULT_SCREENSHOT_DELAY_SECS: u64 = 5;

/// Directory that receives downloaded media before upload.
pub const DEFAULT_DOWNLOAD_DIR: &str = "screenshots";

/// Timeout applied to every outbound HTTP call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub screenshot: ScreenshotConfig,
    pub storage: StorageConfig,
    pub records: RecordStoreConfig,
    pub pipeline: PipelineConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Screenshot rendering service credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    pub api_url: String,
    pub api_key: String,
    pub secret: String,
    pub delay_secs: u64,
}

impl std::fmt::Debug for ScreenshotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("delay_secs", &self.delay_secs)
            .finish()
    }
}

impl ScreenshotConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("TECHULUS_API_URL").unwrap_or_default(),
            api_key: std::env::var("TECHULUS_API_KEY").unwrap_or_default(),
            secret: std::env::var("TECHULUS_SECRET").unwrap_or_default(),
            delay_secs: env_or("SCREENSHOT_DELAY_SECS", DEFAULT_SCREENSHOT_DELAY_SECS),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty() && !self.secret.is_empty()
    }
}

/// How created child records are written onto the parent record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMode {
    /// One update carrying every child id
    #[default]
    Batch,
    /// One concurrent update per child id; the store's last write wins
    PerChild,
}

impl FromStr for LinkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" => Ok(LinkMode::Batch),
            "per-child" | "per_child" | "perchild" => Ok(LinkMode::PerChild),
            _ => Err(anyhow::anyhow!("Invalid link mode: {} (expected batch or per-child)", s)),
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub download_dir: PathBuf,
    pub link_mode: LinkMode,
    /// Cap on in-flight units per stage; `None` runs every unit at once
    pub max_concurrency: Option<usize>,
    pub http_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            link_mode: LinkMode::Batch,
            max_concurrency: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let link_mode = match std::env::var("PIPELINE_LINK_MODE") {
            Ok(mode) => mode.parse()?,
            Err(_) => LinkMode::default(),
        };

        let max_concurrency = match std::env::var("PIPELINE_MAX_CONCURRENCY") {
            Ok(value) if !value.trim().is_empty() => Some(value.trim().parse().map_err(|_| {
                anyhow::anyhow!("PIPELINE_MAX_CONCURRENCY must be a positive integer, got {}", value)
            })?),
            _ => None,
        };

        Ok(Self {
            download_dir: std::env::var("PIPELINE_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            link_mode,
            max_concurrency,
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Build configuration from the current process environment without validating it
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server: ServerConfig {
                host: std::env::var("MEDIAFLOW_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("MEDIAFLOW_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "MEDIAFLOW_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
            screenshot: ScreenshotConfig::from_env(),
            storage: StorageConfig::from_env(),
            records: RecordStoreConfig::from_env(),
            pipeline: PipelineConfig::from_env()?,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.storage.bucket.trim().is_empty() {
            anyhow::bail!("AWS_S3_BUCKET cannot be empty");
        }

        if self.records.base_id.trim().is_empty() {
            anyhow::bail!("AIRTABLE_BASE must be set");
        }

        if self.records.token.trim().is_empty() {
            anyhow::bail!("AIRTABLE_TOKEN must be set");
        }

        if self.pipeline.max_concurrency == Some(0) {
            anyhow::bail!("PIPELINE_MAX_CONCURRENCY must be greater than 0");
        }

        if !self.screenshot.is_configured() {
            tracing::warn!("Screenshot service is not configured - /screenshot requests will fail");
        }

        Ok(())
    }
}

/// Parse an environment variable, falling back to `default` when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
