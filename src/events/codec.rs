//! Wire format for progress notifications.
//!
//! Every event travels as one self-delimited frame:
//!
//! ```text
//! data: {"type":"progress","percentage":33,"message":"Rectified chunk 1 of 3"}\n\n
//! ```
//!
//! The payload is compact JSON tagged by `type`. A frame is terminated by the
//! blank line, so a consumer can split the byte stream on `"\n\n"` without
//! understanding the payload.

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of every frame line carrying a payload.
pub const FRAME_PREFIX: &str = "data: ";

/// Terminator of every frame.
pub const FRAME_TERMINATOR: &str = "\n\n";

/// One notification on the event stream.
///
/// A stream carries any number of `Progress`/`Activity` events and ends with
/// exactly one `Complete` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Percentage-based progress, used when the number of units is known.
    Progress {
        #[serde(deserialize_with = "clamped_percentage")]
        percentage: u8,
        message: String,
    },
    /// Open-ended activity, used when the amount of work is unknown.
    Activity { message: String },
    /// Terminal success carrying the assembled markdown.
    Complete { markdown: String },
    /// Terminal failure carrying a contextualized message.
    Error { error: String },
}

impl ProgressEvent {
    /// Build a progress event; the percentage is clamped to `0..=100`.
    pub fn progress(percentage: i64, message: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            percentage: clamp_percentage(percentage),
            message: message.into(),
        }
    }

    pub fn activity(message: impl Into<String>) -> Self {
        ProgressEvent::Activity {
            message: message.into(),
        }
    }

    pub fn complete(markdown: impl Into<String>) -> Self {
        ProgressEvent::Complete {
            markdown: markdown.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ProgressEvent::Error {
            error: error.into(),
        }
    }

    /// Whether this event ends a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }
}

fn clamp_percentage(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn clamped_percentage<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(clamp_percentage(value.round() as i64))
}

/// Serialize an event into a single `data: <json>\n\n` frame.
pub fn format_event(event: &ProgressEvent) -> String {
    let payload = serde_json::to_string(event)
        .unwrap_or_else(|_| r#"{"type":"error","error":"event encoding failed"}"#.to_string());
    format!("{FRAME_PREFIX}{payload}{FRAME_TERMINATOR}")
}

/// Parse one frame back into an event.
///
/// Returns `None` for empty input, keep-alive comments and malformed
/// payloads. Consumers drop those frames instead of failing.
pub fn parse_event(frame: &str) -> Option<ProgressEvent> {
    let frame = frame.trim();
    if frame.is_empty() {
        return None;
    }

    let payload: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if payload.is_empty() {
        return None;
    }

    serde_json::from_str(&payload.join("\n")).ok()
}
