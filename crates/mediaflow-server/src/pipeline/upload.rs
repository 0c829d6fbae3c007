//! Upload stage: push every downloaded file to object storage

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::download::remove_local_files;
use super::error::{PipelineError, Stage};
use super::fanout::{fan_out, CancelMode};
use super::types::{DownloadedItem, StoredAddress};
use crate::storage::ObjectStore;

async fn upload_one(
    store: Arc<dyn ObjectStore>,
    item: DownloadedItem,
) -> mediaflow_common::Result<StoredAddress> {
    let size = tokio::fs::metadata(&item.path).await?.len();
    let key = store.object_key(&item.file_name);

    store
        .put_file(&key, &item.path, size, item.content_type.as_deref())
        .await?;

    let url = store.durable_url(&key);
    debug!(index = item.source_index, key = %key, url = %url, "Item uploaded");

    if let Err(e) = tokio::fs::remove_file(&item.path).await {
        warn!(path = %item.path.display(), error = %e, "Failed to remove uploaded local file");
    }

    Ok(StoredAddress {
        source_index: item.source_index,
        key,
        url,
    })
}

/// Upload every item concurrently, returning durable addresses in source order
///
/// A put that has started is never interrupted, so every object that reached
/// storage is known. On failure the local files that are still around are
/// removed and those objects are logged as orphans.
pub async fn upload_all(
    store: &Arc<dyn ObjectStore>,
    items: Vec<DownloadedItem>,
    max_concurrency: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Vec<StoredAddress>, PipelineError> {
    let result = fan_out(
        Stage::Upload,
        items.clone(),
        max_concurrency,
        CancelMode::Drain,
        cancel,
        |item| upload_one(Arc::clone(store), item),
    )
    .await;

    match result {
        Ok(addresses) => Ok(addresses),
        Err(failure) => {
            remove_local_files(&items).await;
            for orphan in &failure.completed {
                warn!(
                    index = orphan.source_index,
                    key = %orphan.key,
                    "Uploaded object orphaned by failed request"
                );
            }
            Err(failure.error)
        },
    }
}
