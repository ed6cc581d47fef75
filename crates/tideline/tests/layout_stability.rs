//! Layout stability under view changes
//!
//! Collapsing sections or notes must only move what comes after them, and
//! never mutate the parsed document.

use tideline::core::LayoutAlgorithm;
use tideline::plugins::sequence::*;
use tideline::{layout, layout_with_view, parse};

const SECTIONED: &str = "\
== Login ==
User -> API: login : token
API -> DB: check
== Browse ==
User -> API: list : items
if cached
  API -> Cache: read
else
  API -> DB: scan
== Checkout ==
User -> API: buy : receipt
note right of API: charged **once**
== Done ==";

fn step_ys(result: &SequenceLayoutResult) -> Vec<(usize, f64)> {
    result.steps.iter().map(|s| (s.step, s.y)).collect()
}

#[test]
fn test_collapsing_a_section_keeps_earlier_sections_in_place() {
    let expanded = layout(SECTIONED).unwrap();
    for collapsed_index in 0..4 {
        let view = ViewState::new().with_collapsed_section(collapsed_index);
        let collapsed = layout_with_view(SECTIONED, &view).unwrap();
        for earlier in 0..=collapsed_index {
            assert_eq!(
                expanded.sections[earlier].y, collapsed.sections[earlier].y,
                "section {earlier} moved when {collapsed_index} collapsed"
            );
        }
        for later in collapsed_index + 1..4 {
            assert!(collapsed.sections[later].y <= expanded.sections[later].y);
        }
    }
}

#[test]
fn test_collapsing_hides_only_that_sections_messages() {
    let db = parse(SECTIONED).unwrap();
    let view = ViewState::new().with_collapsed_section(1);
    let result = SequenceLayoutAlgorithm::new().with_view(view).layout(&db).unwrap();

    let hidden = db.section_messages(1);
    assert_eq!(hidden, 2..5);
    assert!(result.steps.iter().all(|s| !hidden.contains(&s.message_index)));
    assert!(result.frames.is_empty());
    assert_eq!(result.sections[1].message_count, 3);
}

#[test]
fn test_steps_before_a_collapsed_section_do_not_move() {
    let expanded = layout(SECTIONED).unwrap();
    let collapsed = layout_with_view(SECTIONED, &ViewState::new().with_collapsed_section(2)).unwrap();
    let boundary = expanded.sections[2].y;
    for (step, y) in step_ys(&expanded).into_iter().filter(|(_, y)| *y < boundary) {
        assert_eq!(collapsed.step_y(step), Some(y));
    }
}

#[test]
fn test_note_visibility_never_moves_steps() {
    let expanded = layout(SECTIONED).unwrap();
    let views = [
        ViewState::new().with_collapsed_note(0),
        ViewState::new().with_notes_hidden(),
    ];
    for view in views {
        let result = layout_with_view(SECTIONED, &view).unwrap();
        assert_eq!(step_ys(&result), step_ys(&expanded));
        assert_eq!(
            result.sections.iter().map(|s| s.y).collect::<Vec<_>>(),
            expanded.sections.iter().map(|s| s.y).collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_relayout_does_not_mutate_document() {
    let db = parse(SECTIONED).unwrap();
    let snapshot = db.clone();
    let mut view = ViewState::new();
    view.toggle_section(0);
    view.toggle_note(0);
    let algorithm = SequenceLayoutAlgorithm::new().with_view(view);
    algorithm.layout(&db).unwrap();
    algorithm.layout(&db).unwrap();
    assert_eq!(db, snapshot);
}

#[test]
fn test_toggling_back_restores_layout() {
    let db = parse(SECTIONED).unwrap();
    let original = SequenceLayoutAlgorithm::new().layout(&db).unwrap();

    let mut view = ViewState::new();
    view.toggle_section(1);
    view.toggle_section(1);
    let restored = SequenceLayoutAlgorithm::new().with_view(view).layout(&db).unwrap();
    assert_eq!(original, restored);
}

#[test]
fn test_callee_endpoints_sit_on_activation_edges() {
    let result = layout("Client -> Server: request : response\nServer -> Store: read : rows").unwrap();
    for step in result.steps.iter().filter(|s| s.kind == StepKind::Call && !s.is_async) {
        let callee = result.participants.iter().find(|p| p.id == step.to).unwrap();
        let activation = result
            .activations
            .iter()
            .filter(|a| a.participant_id == step.to && a.start_step == step.step)
            .max_by_key(|a| a.depth)
            .unwrap();
        assert_ne!(step.to_x, callee.x);
        assert!(step.to_x == activation.rect.x || step.to_x == activation.rect.right());
    }
}

#[test]
fn test_async_calls_end_on_the_lifeline() {
    let result = layout("A ~> B: fire").unwrap();
    let b = result.participants.iter().find(|p| p.id == "B").unwrap();
    assert_eq!(result.steps[0].to_x, b.x);
    assert!(result.activations.is_empty());
}
