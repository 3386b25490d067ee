//! Best-effort progress parsing
//!
//! Progress payloads are not trusted to be well formed: numbers are pulled
//! out of free text and clamped to 0..=100.

use once_cell::sync::Lazy;
use regex::Regex;

use super::sse::SseEvent;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is valid"));

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percent pattern is valid"));

/// What a stream event means for the run
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    Progress(u8),
    Complete,
    Error(String),
    Ignored,
}

/// Clamp a raw percentage to 0..=100. `None` for NaN.
pub fn clamp_percent(value: f64) -> Option<u8> {
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, 100.0).round() as u8)
}

/// First `N%` in `text`, else the first number, as a clamped percentage
pub fn extract_percent(text: &str) -> Option<u8> {
    PERCENT
        .captures(text)
        .and_then(|c| c.get(1))
        .or_else(|| NUMBER.find(text))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .and_then(clamp_percent)
}

/// Poll responses containing "complete" (any case) are terminal
pub fn is_complete_text(text: &str) -> bool {
    text.to_ascii_lowercase().contains("complete")
}

/// Classify a stream event
pub fn classify(event: &SseEvent) -> StreamSignal {
    match event.event.as_str() {
        "complete" => StreamSignal::Complete,
        "error" => StreamSignal::Error(event.data.clone()),
        "progress" | "message" => match event.data.trim().parse::<f64>() {
            Ok(value) => clamp_percent(value)
                .map(StreamSignal::Progress)
                .unwrap_or(StreamSignal::Ignored),
            Err(_) => extract_percent(&event.data)
                .map(StreamSignal::Progress)
                .unwrap_or(StreamSignal::Ignored),
        },
        _ => StreamSignal::Ignored,
    }
}
