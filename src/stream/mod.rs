//! Per-request event streams.

mod controller;

pub use controller::{spawn_event_stream, EventStream, StreamController};
