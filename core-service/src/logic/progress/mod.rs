//! Progress Module - Stream/Poll observation of a running job
//!
//! # Architecture
//! - `sse.rs`: `text/event-stream` decoder
//! - `parse.rs`: Best-effort percentage extraction and event classification
//! - `observer.rs`: Stream -> poll state machine running as one task
//!
//! # Failure Strategy
//! Any stream failure escalates once to polling. There is no further retry.

pub mod observer;
pub mod parse;
pub mod sse;
#[cfg(test)]
mod tests;

pub use observer::{ObserverConfig, ObserverEvent, ProgressObserver};
pub use parse::{classify, clamp_percent, extract_percent, is_complete_text, StreamSignal};
pub use sse::{SseDecoder, SseEvent};
