//! Event codec for the progress stream.

mod codec;
mod decoder;

pub use codec::{format_event, parse_event, ProgressEvent, FRAME_PREFIX, FRAME_TERMINATOR};
pub use decoder::FrameDecoder;
