//! Pipeline error types

use mediaflow_common::MediaError;
use thiserror::Error;

/// Fan-out stage of the ingestion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    Upload,
    CreateRecords,
    Link,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Upload => "upload",
            Stage::CreateRecords => "create_records",
            Stage::Link => "link",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped pipeline failure; the first failing unit aborts the request
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid ingestion request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} stage failed on item {index}: {source}")]
    Stage {
        stage: Stage,
        index: usize,
        source: MediaError,
    },

    #[error("{stage} stage cancelled")]
    Cancelled { stage: Stage },

    #[error("{stage} worker for item {index} panicked: {message}")]
    WorkerPanicked {
        stage: Stage,
        index: usize,
        message: String,
    },

    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. }
            | PipelineError::Cancelled { stage }
            | PipelineError::WorkerPanicked { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// True when an external collaborator (source host, storage, record store) failed
    pub fn is_upstream(&self) -> bool {
        matches!(self, PipelineError::Stage { source, .. } if source.is_upstream())
    }
}
