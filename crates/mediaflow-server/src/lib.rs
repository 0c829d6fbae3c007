//! Mediaflow Server Library
//!
//! HTTP service that ingests media into a tabular record store.
//!
//! # Overview
//!
//! A request names a parent record and one or more media sources (a web page
//! to screenshot, or hosted files). Every source is downloaded, uploaded to
//! S3-compatible object storage, turned into a child record, and finally the
//! parent record is updated to reference all of its new children.
//!
//! - **API Endpoints**: `POST /screenshot`, `POST /attachment`, `GET /health`
//! - **Pipeline**: concurrent fan-out stages with a barrier between them
//! - **Storage Backend**: S3-compatible object storage
//! - **Record Store**: Airtable-compatible REST API
//! - **Configuration**: Environment-based configuration management
//!
//! # Architecture
//!
//! Each pipeline stage runs one task per item and waits for all of them
//! before the next stage starts. The first failure cancels the rest of the
//! stage and fails the request; the process keeps serving.

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod pipeline;
pub mod records;
pub mod storage;

pub use config::Config;
pub use error::AppError;
pub use pipeline::MediaPipeline;
