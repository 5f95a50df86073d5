//! Sequential chunk rectification.

use std::time::Instant;

use tracing::{debug, error, info};

use crate::capabilities::Rectifier;
use crate::error::{ServiceError, ServiceResult, RECTIFICATION};
use crate::progress::{ProgressObserver, RectifyProgress};
use crate::types::{Chunk, RectifiedChunk};

/// Run every chunk through `rectifier`, one at a time, in index order.
///
/// The observer hears about each finished chunk before the next one starts.
/// The first failure stops the run; no partial output is returned and later
/// chunks are never sent to the rectifier. An empty input yields an empty
/// result and no progress.
pub async fn rectify_document(
    chunks: &[Chunk],
    rectifier: &dyn Rectifier,
    observer: &dyn ProgressObserver,
) -> ServiceResult<Vec<RectifiedChunk>> {
    let total = chunks.len();
    let started = Instant::now();
    let mut rectified = Vec::with_capacity(total);

    info!(chunks = total, rectifier = rectifier.name(), "Starting rectification");

    for (position, chunk) in chunks.iter().enumerate() {
        if observer.is_cancelled() {
            info!(completed = position, total, "Consumer went away, stopping");
            return Err(ServiceError::cancelled(RECTIFICATION));
        }

        let result = rectifier.rectify_chunk(chunk).await.map_err(|e| {
            error!(chunk = chunk.index, error = %e, "Chunk rectification failed");
            ServiceError::transformation(RECTIFICATION, e)
        })?;

        if result.index != chunk.index {
            error!(
                expected = chunk.index,
                actual = result.index,
                "Rectifier returned a chunk out of place"
            );
            return Err(ServiceError::transformation(
                RECTIFICATION,
                format!(
                    "rectifier returned chunk {} for chunk {}",
                    result.index, chunk.index
                ),
            ));
        }

        debug!(chunk = chunk.index, chars = result.rectified_content.len(), "Chunk done");
        rectified.push(result);

        observer
            .on_progress(RectifyProgress::new(position + 1, total))
            .await;
    }

    info!(
        chunks = total,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rectification complete"
    );

    Ok(rectified)
}
