//! Mediaflow Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the mediaflow workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`MediaError`] and the [`Result`] alias returned by
//!   every collaborator (downloader, object store, record store)
//! - **Logging**: centralized `tracing` subscriber setup driven by environment
//!
//! # Example
//!
//! ```no_run
//! use mediaflow_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{MediaError, Result};
