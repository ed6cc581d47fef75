//! Behavioural properties of the parser, timeline and ordering

use tideline::core::{DiagramError, Parser};
use tideline::plugins::sequence::*;

fn parse(input: &str) -> SequenceDatabase {
    let mut db = SequenceDatabase::new();
    SequenceParser::new().parse(input, &mut db).unwrap();
    db
}

fn parse_err(input: &str) -> DiagramError {
    let mut db = SequenceDatabase::new();
    let err = SequenceParser::new().parse(input, &mut db).unwrap_err();
    err.downcast_ref::<DiagramError>().unwrap().clone()
}

fn ordered_ids(db: &SequenceDatabase) -> Vec<String> {
    order_participants(db)
        .into_iter()
        .map(|i| db.participants()[i].id.clone())
        .collect()
}

#[test]
fn test_whitespace_tolerance() {
    for input in ["A->B:msg", "A -> B: msg", "A  ->  B  :  msg"] {
        let db = parse(input);
        let message = &db.messages()[0];
        assert_eq!(message.from, "A", "{input}");
        assert_eq!(message.to, "B", "{input}");
        assert_eq!(message.label, "msg", "{input}");
    }
}

#[test]
fn test_return_label_precedence() {
    let cases = [
        ("A -> B: L <- R", "L", Some("R")),
        ("A -> B: fn(): T", "fn()", Some("T")),
        ("A -> B: a:b", "a", Some("b")),
        ("A -> B: http://x.com", "http://x.com", None),
    ];
    for (input, label, return_label) in cases {
        let db = parse(input);
        let message = &db.messages()[0];
        assert_eq!(message.label, label, "{input}");
        assert_eq!(message.return_label.as_deref(), return_label, "{input}");
    }
}

#[test]
fn test_request_response_sequence() {
    let db = parse("A -> B: request : response");
    let steps = build_render_sequence(db.messages());
    assert_eq!(steps.len(), 2);
    assert_eq!((steps[0].kind, steps[0].from.as_str(), steps[0].to.as_str()), (StepKind::Call, "A", "B"));
    assert_eq!(steps[0].label, "request");
    assert_eq!((steps[1].kind, steps[1].from.as_str(), steps[1].to.as_str()), (StepKind::Return, "B", "A"));
    assert_eq!(steps[1].label, "response");

    assert_eq!(
        compute_activations(&steps),
        vec![Activation {
            participant_id: "B".into(),
            start_step: 0,
            end_step: 1,
            depth: 0,
        }]
    );
}

#[test]
fn test_self_call() {
    let steps = build_render_sequence(parse("A -> A: think : done").messages());
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].kind, StepKind::Call);
    assert_eq!(steps[1].kind, StepKind::Return);
    assert!(steps.iter().all(|s| s.from == "A" && s.to == "A"));
    assert_eq!(steps[1].label, "done");
}

#[test]
fn test_async_has_no_return() {
    let steps = build_render_sequence(parse("A ~> B: fire").messages());
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].kind, StepKind::Call);
    assert!(steps[0].is_async);
}

#[test]
fn test_if_chain_shape() {
    let db = parse(
        "if a\n  A -> B: 1\n  A -> B: 2\n  A -> B: 3\nelse if b\n  A -> C: 4\nelse if c\n  A -> D: 5",
    );
    let SequenceElement::Block(block) = &db.elements()[0] else {
        panic!("expected a block");
    };
    assert_eq!(block.children.len(), 3);
    let labels: Vec<_> = block.else_if_branches.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["b", "c"]);
    assert!(block.else_children.is_empty());
}

#[test]
fn test_parallel_with_branches_is_an_error() {
    for (input, line) in [
        ("parallel\n  A -> B: x\nelse\n  A -> C: y", 3),
        ("A -> B: x\nparallel jobs\n  A -> B: x\n  A -> C: y\nelse if again\n  A -> D: z", 5),
    ] {
        let err = parse_err(input);
        assert!(matches!(err, DiagramError::Structural { .. }));
        assert_eq!(err.line(), Some(line), "{input}");
    }
}

#[test]
fn test_negative_one_position_is_last() {
    let db = parse("First position -1\nA -> B: x\nB -> C: y\nC -> First: z");
    assert_eq!(ordered_ids(&db).last().map(String::as_str), Some("First"));
}

#[test]
fn test_colliding_positions_do_not_repeat() {
    let db = parse("A position 0\nB position 0\nC position 0\nA -> B: x\nB -> C: y\nC -> D: z");
    let mut order = order_participants(&db);
    assert_eq!(order.len(), 4);
    order.sort_unstable();
    order.dedup();
    assert_eq!(order.len(), 4);
}

#[test]
fn test_parse_is_idempotent() {
    let input = "title: T\n## G(blue)\n  Api\nUser -> Api: a : b\nloop poll\n  Api ~> Queue: c\nnote left of Api: d";
    assert_eq!(parse(input), parse(input));
}

#[test]
fn test_group_scenario() {
    let db = parse("## Backend(blue)\n  API\nAPI -> DB: query");
    assert!(db.error().is_none());
    assert_eq!(db.groups().len(), 1);
    let group = &db.groups()[0];
    assert_eq!(group.name, "Backend");
    assert_eq!(group.color.as_deref(), Some("blue"));
    assert_eq!(group.participant_ids, vec!["API"]);

    assert_eq!(db.participant_count(), 2);
    assert_eq!(db.participants()[0].id, "API");
    assert_eq!(
        db.participant("DB").unwrap().participant_type,
        ParticipantType::Database
    );
    assert_eq!(db.message_count(), 1);
}
