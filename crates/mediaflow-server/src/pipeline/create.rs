//! Record creation stage: one child record per stored item

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{PipelineError, Stage};
use super::fanout::{fan_out, CancelMode};
use super::types::{ChildRecord, StoredAddress};
use crate::records::RecordStore;

async fn create_one(
    records: Arc<dyn RecordStore>,
    parent_id: String,
    address: StoredAddress,
) -> mediaflow_common::Result<ChildRecord> {
    let created = records.create_media_record(&parent_id, &address.url).await?;
    debug!(
        index = address.source_index,
        record_id = %created.id,
        "Child record created"
    );

    Ok(ChildRecord {
        source_index: address.source_index,
        record_id: created.id,
        backing_address: address,
        created_time: created.created_time,
    })
}

/// Create a child record for every address, linked to `parent_id`
///
/// Create calls already in flight when a sibling fails are allowed to finish;
/// every record that was created is logged as an orphan and left in place.
pub async fn create_all(
    records: &Arc<dyn RecordStore>,
    parent_id: &str,
    addresses: Vec<StoredAddress>,
    max_concurrency: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<ChildRecord>, PipelineError> {
    let result = fan_out(
        Stage::CreateRecords,
        addresses,
        max_concurrency,
        CancelMode::Drain,
        cancel,
        |address| create_one(Arc::clone(records), parent_id.to_string(), address),
    )
    .await;

    result.map_err(|failure| {
        for orphan in &failure.completed {
            warn!(
                parent_id,
                index = orphan.source_index,
                record_id = %orphan.record_id,
                "Child record orphaned by failed request"
            );
        }
        failure.error
    })
}
