//! Integration tests for tracing spans and events
//!
//! These tests verify that the pipeline runs under an installed subscriber
//! and that logging initialisation validates its inputs.

use tideline::core::logging::{init_logging, LogFormat};
use tideline::{layout, parse};
use tracing_subscriber::util::SubscriberInitExt;

#[test]
fn test_pipeline_under_trace_subscriber() {
    let _guard = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .set_default();

    let result = layout("User -> API: call : ok\nif retry\n  API -> DB: again\nnote: done").unwrap();
    assert_eq!(result.participants.len(), 3);
    assert_eq!(result.frames.len(), 1);
}

#[test]
fn test_parse_errors_are_logged_and_returned() {
    let _guard = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .set_default();

    assert!(parse("A -> B: x\n# bad").is_err());
}

#[test]
fn test_init_logging_rejects_unknown_format() {
    let result = init_logging(Some("debug"), Some("xml"));
    assert!(result.is_err());
}

#[test]
fn test_init_logging_compact() {
    // A global subscriber may already be installed by another test
    let _ = init_logging(Some("debug"), Some("compact"));
    let db = parse("A -> B: x").unwrap();
    assert_eq!(db.message_count(), 1);
}

#[test]
fn test_log_format_parsing() {
    assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
    assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
    assert!("yaml".parse::<LogFormat>().is_err());
    assert_eq!(LogFormat::variants(), &["compact", "pretty", "json"]);
}
