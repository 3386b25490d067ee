use super::*;
use crate::logic::backend::{Backend, JobId};
use crate::logic::test_support::{MockBackend, StreamStep};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// DECODER / PARSER
// ============================================================================

#[test]
fn test_decoder_handles_split_chunks() {
    let mut decoder = SseDecoder::new();

    assert!(decoder.feed(b"event: prog").is_empty());
    assert!(decoder.feed(b"ress\ndata: 4").is_empty());
    let events = decoder.feed(b"0\n\nevent: complete\ndata: done\n\n");

    assert_eq!(
        events,
        vec![SseEvent::new("progress", "40"), SseEvent::new("complete", "done")]
    );
}

#[test]
fn test_decoder_comments_crlf_and_multiline() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b": keep-alive\r\n\r\ndata: line one\r\ndata: line two\r\n\r\n");

    assert_eq!(events, vec![SseEvent::new("message", "line one\nline two")]);
}

#[test]
fn test_decoder_flushes_unterminated_event() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"event: progress\ndata: 75").is_empty());
    assert_eq!(decoder.finish(), Some(SseEvent::new("progress", "75")));
    assert_eq!(decoder.finish(), None);
}

#[test]
fn test_classify_events() {
    assert_eq!(classify(&SseEvent::new("progress", "42.6")), StreamSignal::Progress(43));
    assert_eq!(classify(&SseEvent::new("progress", "150")), StreamSignal::Progress(100));
    assert_eq!(classify(&SseEvent::new("progress", "job-3: 40%")), StreamSignal::Progress(40));
    assert_eq!(classify(&SseEvent::new("message", "at 20%")), StreamSignal::Progress(20));
    assert_eq!(classify(&SseEvent::new("progress", "warming up")), StreamSignal::Ignored);
    assert_eq!(classify(&SseEvent::new("complete", "")), StreamSignal::Complete);
    assert_eq!(
        classify(&SseEvent::new("error", "unknown job")),
        StreamSignal::Error("unknown job".to_string())
    );
    assert_eq!(classify(&SseEvent::new("heartbeat", "1")), StreamSignal::Ignored);
}

#[test]
fn test_poll_text_parsing() {
    assert_eq!(extract_percent("55% complete"), Some(55));
    assert_eq!(extract_percent("progress: 12.5 of 100"), Some(13));
    assert_eq!(extract_percent("queued"), None);
    assert_eq!(extract_percent("job-3 at 40%"), Some(40));
    assert_eq!(extract_percent("step -5 of 9"), Some(5));

    assert!(is_complete_text("55% complete"));
    assert!(is_complete_text("COMPLETED"));
    assert!(!is_complete_text("40%"));
    assert_eq!(clamp_percent(f64::NAN), None);
}

// ============================================================================
// OBSERVER
// ============================================================================

fn fast_config() -> ObserverConfig {
    ObserverConfig {
        poll_interval: Duration::from_millis(20),
        stall_timeout: None,
    }
}

fn job() -> JobId {
    JobId::new("job-1").unwrap()
}

/// Collect observer events until a terminal one or the time limit
async fn collect(rx: &mut mpsc::UnboundedReceiver<ObserverEvent>) -> Vec<ObserverEvent> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        let terminal = matches!(event, ObserverEvent::Complete | ObserverEvent::Stalled);
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

#[tokio::test]
async fn test_stream_runs_to_completion() {
    let mock = Arc::new(MockBackend::new().with_stream(vec![
        StreamStep::progress("10"),
        StreamStep::progress("55"),
        StreamStep::complete(),
    ]));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
    let events = collect(&mut rx).await;
    observer.shutdown().await;

    assert_eq!(
        events,
        vec![
            ObserverEvent::Progress(10),
            ObserverEvent::Progress(55),
            ObserverEvent::Complete
        ]
    );
    assert_eq!(mock.stream_opens(), 1);
    assert_eq!(mock.stream_closes(), 1);
    assert_eq!(mock.polls(), 0);
}

#[tokio::test]
async fn test_stream_error_falls_back_to_polling() {
    let mock = Arc::new(
        MockBackend::new()
            .with_stream(vec![StreamStep::progress("40"), StreamStep::Fail])
            .with_polls(vec![Ok("55% complete")]),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
    let events = collect(&mut rx).await;
    observer.shutdown().await;

    // No progress reset between the fallback and the first poll answer
    assert_eq!(
        events,
        vec![
            ObserverEvent::Progress(40),
            ObserverEvent::FellBackToPolling,
            ObserverEvent::Progress(55),
            ObserverEvent::Complete
        ]
    );
    assert_eq!(mock.stream_closes(), 1);
    assert_eq!(mock.polls(), 1);
}

#[tokio::test]
async fn test_error_event_and_end_of_stream_fall_back() {
    for steps in [
        vec![StreamStep::Event(SseEvent::new("error", "boom"))],
        vec![StreamStep::progress("25")],
    ] {
        let mock = Arc::new(
            MockBackend::new()
                .with_stream(steps)
                .with_polls(vec![Ok("75%"), Ok("100% complete")]),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
        let events = collect(&mut rx).await;
        observer.shutdown().await;

        assert!(events.contains(&ObserverEvent::FellBackToPolling));
        assert_eq!(events.last(), Some(&ObserverEvent::Complete));
        assert_eq!(
            events.iter().filter(|e| **e == ObserverEvent::Complete).count(),
            1
        );
        assert_eq!(mock.polls(), 2);
    }
}

#[tokio::test]
async fn test_failed_polls_keep_polling() {
    let mock = Arc::new(
        MockBackend::new()
            .with_stream(vec![StreamStep::Fail])
            .with_polls(vec![Err(502), Err(502), Ok("complete")]),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
    let events = collect(&mut rx).await;
    observer.shutdown().await;

    assert_eq!(events, vec![ObserverEvent::FellBackToPolling, ObserverEvent::Complete]);
    assert_eq!(mock.polls(), 3);
}

#[tokio::test]
async fn test_stream_open_failure_polls() {
    let mock = Arc::new(MockBackend::new().with_polls(vec![Ok("done, complete")]));
    *mock.stream_open_fails.lock() = true;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
    let events = collect(&mut rx).await;
    observer.shutdown().await;

    assert_eq!(events, vec![ObserverEvent::FellBackToPolling, ObserverEvent::Complete]);
    assert_eq!(mock.stream_closes(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_open_stream() {
    let mock = Arc::new(
        MockBackend::new().with_stream(vec![StreamStep::progress("10"), StreamStep::Hang]),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
    assert_eq!(rx.recv().await, Some(ObserverEvent::Progress(10)));

    observer.shutdown().await;

    assert_eq!(mock.stream_closes(), 1);
    assert_eq!(mock.polls(), 0);
    // Sender dropped with the task
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn test_shutdown_stops_polling() {
    let mock = Arc::new(
        MockBackend::new()
            .with_stream(vec![StreamStep::Fail])
            .with_polls(vec![Ok("30%")]),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), fast_config(), tx);
    assert_eq!(rx.recv().await, Some(ObserverEvent::FellBackToPolling));
    assert_eq!(rx.recv().await, Some(ObserverEvent::Progress(30)));

    observer.shutdown().await;
    let polls = mock.polls();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(mock.polls(), polls);
    assert_eq!(mock.stream_closes(), 1);
}

#[tokio::test]
async fn test_stall_timeout_while_polling() {
    let mock = Arc::new(
        MockBackend::new()
            .with_stream(vec![StreamStep::Fail])
            .with_polls(vec![Ok("40%")]),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = ObserverConfig {
        poll_interval: Duration::from_millis(10),
        stall_timeout: Some(Duration::from_millis(150)),
    };

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), config, tx);
    let events = collect(&mut rx).await;
    observer.shutdown().await;

    assert_eq!(events.last(), Some(&ObserverEvent::Stalled));
    assert!(!events.contains(&ObserverEvent::Complete));
}

#[tokio::test]
async fn test_stall_timeout_while_streaming() {
    let mock = Arc::new(MockBackend::new().with_stream(vec![StreamStep::Hang]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = ObserverConfig {
        poll_interval: Duration::from_millis(10),
        stall_timeout: Some(Duration::from_millis(50)),
    };

    let observer = ProgressObserver::spawn(mock.clone() as Arc<dyn Backend>, job(), config, tx);
    let events = collect(&mut rx).await;
    observer.shutdown().await;

    assert_eq!(events, vec![ObserverEvent::Stalled]);
    assert_eq!(mock.stream_closes(), 1);
    assert_eq!(mock.polls(), 0);
}
