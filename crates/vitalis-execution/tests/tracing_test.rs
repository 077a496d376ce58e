use tokio::sync::mpsc;
use vitalis_execution::{LoggingOptions, init_tracing, init_tracing_with};

// One test per binary: the global subscriber can only be installed once.
#[test]
fn test_global_subscriber_forwards_events_once_installed() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    init_tracing_with(LoggingOptions {
        filter: "debug".to_string(),
        json: true,
        events: Some(tx),
    })
    .unwrap();

    tracing::info!(target: "vitalis_execution::test", "[Diagnostics] hello");
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let diagnostics = events
        .iter()
        .find(|e| e.component.as_deref() == Some("Diagnostics"))
        .unwrap();
    assert_eq!(diagnostics.message, "hello");

    assert!(init_tracing("info").is_err());
}
