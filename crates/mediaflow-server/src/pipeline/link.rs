//! Link stage: point the parent record at its new children

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::error::{PipelineError, Stage};
use super::fanout::{fan_out, CancelMode};
use super::types::ChildRecord;
use crate::config::LinkMode;
use crate::records::RecordStore;

/// Patch the parent with every child id and wait for the patches to finish.
///
/// Returns the number of patch calls issued.
pub async fn link_all(
    records: &Arc<dyn RecordStore>,
    parent_id: &str,
    children: &[ChildRecord],
    mode: LinkMode,
    max_concurrency: Option<usize>,
    cancel: &CancellationToken,
) -> Result<usize, PipelineError> {
    if children.is_empty() {
        return Ok(0);
    }

    let child_ids: Vec<String> = children.iter().map(|c| c.record_id.clone()).collect();

    let patches = match mode {
        LinkMode::Batch => {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled { stage: Stage::Link });
            }

            // Once sent, the patch is awaited so its outcome is always known
            records
                .link_children(parent_id, &child_ids)
                .await
                .map_err(|source| PipelineError::Stage {
                    stage: Stage::Link,
                    index: 0,
                    source,
                })?;
            1
        },
        LinkMode::PerChild => {
            let linked = fan_out(
                Stage::Link,
                child_ids,
                max_concurrency,
                CancelMode::Drain,
                cancel,
                |child_id| {
                    let records = Arc::clone(records);
                    let parent_id = parent_id.to_string();
                    async move { records.link_children(&parent_id, &[child_id]).await }
                },
            )
            .await
            .map_err(|failure| failure.error)?;

            linked.len()
        },
    };

    info!(parent_id, children = children.len(), patches, mode = ?mode, "Parent record linked");
    Ok(patches)
}
