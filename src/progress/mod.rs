//! Progress reporting between the orchestrators and whoever is listening.
//!
//! Orchestrators never know about frames or transports. They talk to a
//! [`ProgressObserver`], which the stream controller implements by encoding
//! frames onto a bounded channel, and which the non-streaming path fills with
//! [`NoopObserver`].

mod state;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use state::{ProgressState, MAX_ACTIVITIES};

/// Progress after one more chunk has been rectified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectifyProgress {
    /// Chunks completed so far
    pub current: usize,
    /// Chunks in the document
    pub total: usize,
    /// `round(current / total * 100)`
    pub percent_complete: u8,
    /// Human-readable description
    pub message: String,
}

impl RectifyProgress {
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            percent_complete: percent_complete(current, total),
            message: format!("Rectified chunk {current} of {total}"),
        }
    }
}

/// `round(current / total * 100)` with halves rounded up, in integers.
///
/// An empty document counts as complete.
pub fn percent_complete(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let current = current.min(total) as u64;
    let total = total as u64;
    ((current * 200 + total) / (2 * total)) as u8
}

/// Receives progress from an orchestrator.
///
/// Calls are awaited before the orchestrator starts the next unit of work,
/// so an observer that applies backpressure slows the producer down.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// A chunk finished.
    async fn on_progress(&self, progress: RectifyProgress) {
        let _ = progress;
    }

    /// A conversion phase started.
    async fn on_activity(&self, message: &str) {
        let _ = message;
    }

    /// Whether the consumer has gone away and remaining work should be skipped.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer for callers that don't need progress.
pub struct NoopObserver;

#[async_trait]
impl ProgressObserver for NoopObserver {}
