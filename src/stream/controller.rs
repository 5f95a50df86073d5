//! Bridge from orchestrator callbacks to an outgoing frame stream.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use crate::error::{ServiceError, ServiceResult};
use crate::events::{format_event, ProgressEvent};
use crate::progress::{ProgressObserver, RectifyProgress};

/// Frames for one request, in order, ending with one terminal frame.
pub type EventStream = ReceiverStream<String>;

/// Sole writer of a request's frame channel.
///
/// Sends wait for channel capacity, so a slow reader suspends the producer.
/// Once the reader is gone, or a terminal frame has been written, further
/// frames are dropped silently.
pub struct StreamController {
    tx: mpsc::Sender<String>,
    terminated: AtomicBool,
}

impl StreamController {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            tx,
            terminated: AtomicBool::new(false),
        }
    }

    /// Encode and enqueue one frame. Returns whether it was written.
    pub async fn emit(&self, event: &ProgressEvent) -> bool {
        if self.terminated.load(Ordering::SeqCst) || self.tx.is_closed() {
            return false;
        }
        if event.is_terminal() && self.terminated.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tx.send(format_event(event)).await.is_ok()
    }

    /// Write the terminal frame for `result`.
    pub async fn finish(&self, result: ServiceResult<String>) -> bool {
        match result {
            Ok(markdown) => self.emit(&ProgressEvent::complete(markdown)).await,
            Err(ServiceError::Cancelled { operation }) => {
                info!(operation = %operation, "Stream closed by consumer");
                false
            }
            Err(e) => {
                error!(error = %e, "Stream ending with error");
                self.emit(&ProgressEvent::error(e.to_string())).await
            }
        }
    }
}

#[async_trait]
impl ProgressObserver for StreamController {
    async fn on_progress(&self, progress: RectifyProgress) {
        self.emit(&ProgressEvent::progress(
            i64::from(progress.percent_complete),
            progress.message,
        ))
        .await;
    }

    async fn on_activity(&self, message: &str) {
        self.emit(&ProgressEvent::activity(message)).await;
    }

    fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Run `work` in its own task and return the frames it produces.
///
/// `initial` is written before `work` starts. The stream always ends with
/// exactly one `complete` or `error` frame unless the reader left first;
/// a panicking worker still produces an `error` frame.
pub fn spawn_event_stream<F, Fut>(
    buffer: usize,
    operation: &'static str,
    initial: ProgressEvent,
    work: F,
) -> EventStream
where
    F: FnOnce(Arc<StreamController>) -> Fut + Send + 'static,
    Fut: Future<Output = ServiceResult<String>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let controller = Arc::new(StreamController::new(tx));

    tokio::spawn(async move {
        controller.emit(&initial).await;

        let worker = tokio::spawn(work(Arc::clone(&controller)));
        let result = match worker.await {
            Ok(result) => result,
            Err(e) => {
                error!(operation, error = %e, "Stream worker aborted");
                Err(ServiceError::transformation(
                    operation,
                    "worker aborted unexpectedly",
                ))
            }
        };

        controller.finish(result).await;
        debug!(operation, "Stream closed");
    });

    ReceiverStream::new(rx)
}
