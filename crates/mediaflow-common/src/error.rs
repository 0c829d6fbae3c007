//! Error types for mediaflow

use thiserror::Error;

/// Result type alias for mediaflow operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Main error type for mediaflow collaborators
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record store error: {0}")]
    RecordStore(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl MediaError {
    /// True when the error only reports that a sibling failure stopped this unit
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MediaError::Cancelled)
    }

    /// True for failures caused by an external collaborator rather than local setup
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            MediaError::Network(_) | MediaError::Storage(_) | MediaError::RecordStore(_)
        )
    }
}
