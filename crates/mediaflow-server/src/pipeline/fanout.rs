//! Fan-out executor shared by every pipeline stage
//!
//! Each input item becomes one spawned task. Results land in a slot keyed by
//! the item's position, so the stage output is in input order no matter which
//! task finishes first. The first failing task cancels the stage token and the
//! executor still waits for every started task before returning (barrier).
//!
//! What the token does to a task that is already running depends on the
//! [`CancelMode`]: units without external side effects are interrupted at
//! their next await point, while units that write to a remote system run to
//! completion so the caller learns about everything that was written.

use futures::stream::{self, StreamExt};
use mediaflow_common::MediaError;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{PipelineError, Stage};

/// How stage cancellation treats a unit that has already started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Drop the unit at its next await point
    Interrupt,
    /// Skip units that have not started; let started ones finish
    Drain,
}

/// A failed stage: the error that aborted it plus whatever had already completed
#[derive(Debug)]
pub struct StageFailure<O> {
    pub error: PipelineError,
    pub completed: Vec<O>,
}

/// Run `work` once per item concurrently and wait for all of them.
///
/// Returns every output in input order, or the first real failure together
/// with the outputs of units that finished successfully. `max_concurrency`
/// caps in-flight units; `None` starts them all at once.
pub async fn fan_out<I, O, F, Fut>(
    stage: Stage,
    items: Vec<I>,
    max_concurrency: Option<usize>,
    mode: CancelMode,
    cancel: &CancellationToken,
    work: F,
) -> Result<Vec<O>, StageFailure<O>>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = mediaflow_common::Result<O>> + Send + 'static,
{
    let total = items.len();
    let limit = max_concurrency.unwrap_or(total).max(1);
    let token = cancel.child_token();

    debug!(%stage, units = total, limit, mode = ?mode, "Fan-out started");

    let mut slots: Vec<Option<O>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut first_error: Option<PipelineError> = None;

    let mut units = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let unit = work(item);
            let token = token.clone();
            async move {
                let handle = tokio::spawn(async move {
                    match mode {
                        CancelMode::Interrupt => tokio::select! {
                            biased;
                            _ = token.cancelled() => Err(MediaError::Cancelled),
                            result = unit => result,
                        },
                        CancelMode::Drain if token.is_cancelled() => Err(MediaError::Cancelled),
                        CancelMode::Drain => unit.await,
                    }
                });
                (index, handle.await)
            }
        })
        .buffer_unordered(limit);

    while let Some((index, joined)) = units.next().await {
        match joined {
            Ok(Ok(output)) => slots[index] = Some(output),
            Ok(Err(source)) => {
                token.cancel();
                if source.is_cancelled() {
                    continue;
                }
                warn!(%stage, index, error = %source, "Unit failed, cancelling stage");
                first_error.get_or_insert(PipelineError::Stage { stage, index, source });
            },
            Err(join_error) => {
                token.cancel();
                warn!(%stage, index, error = %join_error, "Unit panicked, cancelling stage");
                first_error.get_or_insert(PipelineError::WorkerPanicked {
                    stage,
                    index,
                    message: join_error.to_string(),
                });
            },
        }
    }

    let completed: Vec<O> = slots.into_iter().flatten().collect();

    match first_error {
        Some(error) => Err(StageFailure { error, completed }),
        None if completed.len() == total => {
            debug!(%stage, units = total, "Fan-out completed");
            Ok(completed)
        },
        None => Err(StageFailure {
            error: PipelineError::Cancelled { stage },
            completed,
        }),
    }
}
