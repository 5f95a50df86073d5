//! Incremental frame decoder for consumers reading a byte stream.

use super::codec::{parse_event, ProgressEvent};
use crate::error::ServiceError;

const TERMINATOR: &[u8] = b"\n\n";

/// Accumulates transport bytes and yields events for every complete frame.
///
/// Frames may be split across reads at any byte, including inside a
/// multi-byte character. Malformed frames are dropped.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    dropped: usize,
    last_error: Option<ServiceError>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return the events completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<ProgressEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = find_terminator(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..pos + TERMINATOR.len()).collect();
            self.accept(&frame, &mut events);
        }
        events
    }

    /// Flush whatever is left once the transport has closed.
    pub fn finish(mut self) -> Option<ProgressEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        self.accept(&rest, &mut events);
        events.pop()
    }

    /// Number of non-empty frames that could not be parsed.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Why the most recent frame was dropped.
    pub fn last_error(&self) -> Option<&ServiceError> {
        self.last_error.as_ref()
    }

    fn accept(&mut self, frame: &[u8], events: &mut Vec<ProgressEvent>) {
        let text = String::from_utf8_lossy(frame);
        match parse_event(&text) {
            Some(event) => events.push(event),
            None if !text.trim().is_empty() => {
                let err = ServiceError::Protocol(text.trim().to_string());
                tracing::debug!(error = %err, "Dropping unparseable frame");
                self.dropped += 1;
                self.last_error = Some(err);
            }
            None => {}
        }
    }
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}
