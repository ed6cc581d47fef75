//! Render sequence and activations
//!
//! Linearises the flat message list into explicit call/return steps by
//! simulating a call stack, then derives per-participant activation
//! intervals from those steps. Both passes are pure and re-run cheaply
//! whenever the view changes.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use super::database::Message;

/// Direction of a render step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    Call,
    Return,
}

/// One call or return event in the linearised timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub from: String,
    pub to: String,
    pub label: String,
    pub message_index: usize,
    #[serde(rename = "async")]
    pub is_async: bool,
}

impl RenderStep {
    fn call(message: &Message) -> Self {
        Self {
            kind: StepKind::Call,
            from: message.from.clone(),
            to: message.to.clone(),
            label: message.label.clone(),
            message_index: message.index,
            is_async: message.is_async,
        }
    }

    fn reply(frame: &CallFrame<'_>) -> Self {
        Self {
            kind: StepKind::Return,
            from: frame.to.to_string(),
            to: frame.from.to_string(),
            label: frame.return_label.unwrap_or_default().to_string(),
            message_index: frame.message_index,
            is_async: false,
        }
    }

    pub fn is_call(&self) -> bool {
        self.kind == StepKind::Call
    }

    pub fn is_self_call(&self) -> bool {
        self.from == self.to
    }
}

/// A contiguous busy interval on one participant's lifeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub participant_id: String,
    pub start_step: usize,
    pub end_step: usize,
    /// Activations still open on the same participant underneath this one
    pub depth: usize,
}

impl Activation {
    pub fn contains(&self, step: usize) -> bool {
        (self.start_step..=self.end_step).contains(&step)
    }
}

/// A sync call waiting for its return
struct CallFrame<'a> {
    from: &'a str,
    to: &'a str,
    return_label: Option<&'a str>,
    message_index: usize,
}

impl<'a> CallFrame<'a> {
    fn new(message: &'a Message) -> Self {
        Self {
            from: &message.from,
            to: &message.to,
            return_label: message.return_label.as_deref(),
            message_index: message.index,
        }
    }
}

/// Build the ordered call/return steps for a message list
///
/// Pending calls are returned as soon as a message is sent by someone other
/// than their callee; async messages never return and self-calls return
/// immediately. Anything still pending at the end is flushed in LIFO order.
///
/// # Example
/// ```
/// use tideline::plugins::sequence::{build_render_sequence, Message, StepKind};
///
/// let messages = vec![Message::new("A", "B", "request").with_return_label(Some("response".into()))];
/// let steps = build_render_sequence(&messages);
/// assert_eq!(steps.len(), 2);
/// assert_eq!(steps[1].kind, StepKind::Return);
/// assert_eq!(steps[1].label, "response");
/// ```
pub fn build_render_sequence(messages: &[Message]) -> Vec<RenderStep> {
    let mut steps = Vec::with_capacity(messages.len() * 2);
    let mut stack: Vec<CallFrame<'_>> = Vec::new();

    for message in messages {
        while let Some(top) = stack.last() {
            if top.to == message.from {
                break;
            }
            if let Some(frame) = stack.pop() {
                steps.push(RenderStep::reply(&frame));
            }
        }

        steps.push(RenderStep::call(message));

        if message.is_async {
            continue;
        }

        let frame = CallFrame::new(message);
        if message.is_self_call() {
            steps.push(RenderStep::reply(&frame));
        } else {
            stack.push(frame);
        }
    }

    while let Some(frame) = stack.pop() {
        steps.push(RenderStep::reply(&frame));
    }

    debug!(
        message_count = messages.len(),
        step_count = steps.len(),
        "Built render sequence"
    );
    steps
}

/// Derive activation intervals from render steps
///
/// A call opens an activation on the callee; the matching return closes the
/// most recent open one on the returning participant. Depth is the number of
/// activations still open on that participant after closing.
pub fn compute_activations(steps: &[RenderStep]) -> Vec<Activation> {
    let mut open: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut activations = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        match step.kind {
            StepKind::Call if step.is_async => {}
            StepKind::Call => open.entry(step.to.as_str()).or_default().push(index),
            StepKind::Return => {
                let Some(stack) = open.get_mut(step.from.as_str()) else {
                    trace!(step = index, participant = %step.from, "Return without open call");
                    continue;
                };
                let Some(start_step) = stack.pop() else {
                    trace!(step = index, participant = %step.from, "Return without open call");
                    continue;
                };
                activations.push(Activation {
                    participant_id: step.from.clone(),
                    start_step,
                    end_step: index,
                    depth: stack.len(),
                });
            }
        }
    }

    debug!(activation_count = activations.len(), "Computed activations");
    activations
}
