//! External tabular record store
//!
//! Child ("media") records are created one per uploaded item and linked to a
//! parent ("listing") record. The pipeline talks to the store only through
//! [`RecordStore`]; [`AirtableClient`] is the HTTP implementation.

use async_trait::async_trait;

pub mod airtable;
pub mod config;
pub mod types;

pub use airtable::AirtableClient;
pub use config::RecordStoreConfig;
pub use types::CreatedRecord;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create one child record pointing at `attachment_url`, linked to `parent_id`
    async fn create_media_record(
        &self,
        parent_id: &str,
        attachment_url: &str,
    ) -> mediaflow_common::Result<CreatedRecord>;

    /// Write `child_ids` onto the parent's children field in a single update
    async fn link_children(
        &self,
        parent_id: &str,
        child_ids: &[String],
    ) -> mediaflow_common::Result<()>;
}
