//! Integration tests for the public API

use tideline::prelude::*;
use tideline::{layout, layout_with_view, parse};

#[test]
fn test_parse_counts() {
    let db = parse("User -> API: login\nAPI -> DB: lookup\nAPI -> User: ok").unwrap();
    assert_eq!(db.participant_count(), 3);
    assert_eq!(db.message_count(), 3);
    assert!(db.error().is_none());
}

#[test]
fn test_parse_title_and_options() {
    let db = parse("chart: sequence\ntitle: Checkout\ntheme: dusk\nA -> B: go").unwrap();
    assert_eq!(db.title(), Some("Checkout"));
    assert_eq!(db.option("theme"), Some("dusk"));
}

#[test]
fn test_layout_basic_geometry() {
    let result = layout("Alice -> Bob: hello : hi").unwrap();
    assert_eq!(result.participants.len(), 2);
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[0].kind, StepKind::Call);
    assert_eq!(result.steps[1].kind, StepKind::Return);
    assert!(result.steps[0].y < result.steps[1].y);
    assert!(result.width > 0.0);
    assert!(result.height > result.steps[1].y);
}

#[test]
fn test_layout_title_passthrough() {
    let result = layout("title: Flow\nA -> B: x").unwrap();
    assert_eq!(result.title.as_deref(), Some("Flow"));
}

#[test]
fn test_components_compose() {
    let input = "Api is a gateway aka Public API\nUser -> Api: call : done";

    let parser = SequenceParser::new();
    let mut database = SequenceDatabase::new();
    parser.parse(input, &mut database).unwrap();

    let algorithm = SequenceLayoutAlgorithm::with_config(LayoutConfig::default().with_step_spacing(60.0));
    let result = algorithm.layout(&database).unwrap();
    let api = result.participants.iter().find(|p| p.id == "Api").unwrap();
    assert_eq!(api.label, "Public API");
    assert_eq!(api.participant_type, ParticipantType::Gateway);
    assert_eq!(result.steps[1].y - result.steps[0].y, 60.0);
}

#[test]
fn test_detector_through_prelude() {
    let detector = SequenceDetector::new();
    assert!(detector.detect("chart: sequence"));
    assert!(detector.detect("A ~> B: fire"));
    assert!(!detector.detect("hello world"));
}

#[test]
fn test_orchestrator_round_trip() {
    let orchestrator = Orchestrator::with_sequence_plugins();
    let result = orchestrator.process("A -> B: x").unwrap();
    assert_eq!(result.participants.len(), 2);
}

#[test]
fn test_layout_with_view_matches_relayout() {
    let input = "== A ==\nX -> Y: one\n== B ==\nX -> Y: two\nnote: n";
    let view = ViewState::new().with_collapsed_section(0).with_collapsed_note(0);

    let direct = layout_with_view(input, &view).unwrap();
    let db = parse(input).unwrap();
    let relaid = SequenceLayoutAlgorithm::new().with_view(view).layout(&db).unwrap();
    assert_eq!(direct, relaid);
}

#[test]
fn test_layout_result_serializes() {
    let result = layout("A -> B: request : response\nif ok\n  B ~> C: event").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["steps"][0]["type"], "call");
    assert_eq!(json["steps"][0]["messageIndex"], 0);
    assert_eq!(json["frames"][0]["type"], "if");
    assert!(json["participants"][0]["type"].is_string());
    assert!(json["lifelineTop"].is_number());
}

#[test]
fn test_database_serializes() {
    let db = parse("## Team(red)\n  A\nA -> B: x").unwrap();
    let json = serde_json::to_value(&db).unwrap();
    assert_eq!(json["groups"][0]["participantIds"][0], "A");
    assert_eq!(json["elements"][0]["kind"], "message");
}
