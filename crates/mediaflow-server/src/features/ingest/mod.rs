pub mod commands;
pub mod routes;

pub use commands::{IngestAttachmentCommand, IngestError, IngestScreenshotCommand};
pub use routes::ingest_routes;
