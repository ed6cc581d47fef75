//! Block frame geometry
//!
//! Maps each `if` / `loop` / `parallel` block onto the visible steps it
//! covers, tallies the vertical padding its header, branches and footer
//! need, and once step Y positions are known, computes the frame rectangle
//! and branch dividers.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use super::database::{message_indices, Block, BlockKind, SequenceElement};
use super::layout::{LayoutConfig, StepIndex};
use crate::core::Rect;

/// A branch divider inside a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDivider {
    /// `else if` condition; `None` for a plain `else`
    pub label: Option<String>,
    pub is_else: bool,
    pub y: f64,
}

/// Positioned block frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFrame {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub label: String,
    pub line_number: usize,
    /// Nesting depth, 0 for top-level blocks
    pub depth: usize,
    pub rect: Rect,
    pub dividers: Vec<FrameDivider>,
}

/// One branch of a block and where its visible steps begin
pub(crate) struct BranchSpan<'a> {
    label: Option<&'a str>,
    first: Option<usize>,
}

/// A block with the filtered step indices it covers
pub(crate) struct BlockSpan<'a> {
    block: &'a Block,
    steps: Vec<usize>,
    branches: Vec<BranchSpan<'a>>,
    children: Vec<BlockSpan<'a>>,
}

impl BlockSpan<'_> {
    fn first(&self) -> Option<usize> {
        self.steps.first().copied()
    }

    fn last(&self) -> Option<usize> {
        self.steps.last().copied()
    }
}

/// Visible steps of a set of messages, sorted
fn covered_steps(messages: &[usize], index: &StepIndex) -> Vec<usize> {
    let mut steps: Vec<usize> = messages
        .iter()
        .flat_map(|&message| index.own_steps_of(message))
        .collect();
    steps.sort_unstable();
    steps.dedup();
    steps
}

/// Build spans for every block in an element list, recursively
pub(crate) fn block_spans<'a>(elements: &'a [SequenceElement], index: &StepIndex) -> Vec<BlockSpan<'a>> {
    let mut spans = Vec::new();
    for element in elements {
        let SequenceElement::Block(block) = element else {
            continue;
        };

        let branches = block
            .else_if_branches
            .iter()
            .map(|branch| BranchSpan {
                label: Some(branch.label.as_str()),
                first: covered_steps(&message_indices(&branch.children), index)
                    .first()
                    .copied(),
            })
            .chain((!block.else_children.is_empty()).then(|| BranchSpan {
                label: None,
                first: covered_steps(&message_indices(&block.else_children), index)
                    .first()
                    .copied(),
            }))
            .collect();

        let mut children = block_spans(&block.children, index);
        for branch in &block.else_if_branches {
            children.extend(block_spans(&branch.children, index));
        }
        children.extend(block_spans(&block.else_children, index));

        spans.push(BlockSpan {
            block,
            steps: covered_steps(&block.message_indices(), index),
            branches,
            children,
        });
    }
    spans
}

/// Vertical padding to insert before each visible step
///
/// Entry `i` applies before filtered step `i`; the final entry applies
/// after the last step.
pub(crate) struct PaddingCounts {
    pub headers: Vec<usize>,
    pub branches: Vec<usize>,
    pub footers: Vec<usize>,
}

impl PaddingCounts {
    pub fn from_spans(spans: &[BlockSpan<'_>], step_count: usize) -> Self {
        let mut counts = Self {
            headers: vec![0; step_count + 1],
            branches: vec![0; step_count + 1],
            footers: vec![0; step_count + 1],
        };
        counts.tally(spans);
        counts
    }

    fn tally(&mut self, spans: &[BlockSpan<'_>]) {
        for span in spans {
            let (Some(first), Some(last)) = (span.first(), span.last()) else {
                continue;
            };
            self.headers[first] += 1;
            for branch in &span.branches {
                if let Some(branch_first) = branch.first {
                    self.branches[branch_first] += 1;
                }
            }
            self.footers[last + 1] += 1;
            self.tally(&span.children);
        }
    }
}

/// Compute frames for all spans, outer frames before the frames they contain
pub(crate) fn layout_frames(
    spans: &[BlockSpan<'_>],
    index: &StepIndex,
    step_y: &[f64],
    x_of: &HashMap<&str, f64>,
    config: &LayoutConfig,
) -> Vec<BlockFrame> {
    let mut frames = Vec::new();
    for span in spans {
        place_frame(span, 0, index, step_y, x_of, config, &mut frames);
    }
    frames
}

fn place_frame(
    span: &BlockSpan<'_>,
    depth: usize,
    index: &StepIndex,
    step_y: &[f64],
    x_of: &HashMap<&str, f64>,
    config: &LayoutConfig,
    frames: &mut Vec<BlockFrame>,
) -> Option<Rect> {
    let (first, last) = (span.first()?, span.last()?);
    let slot = frames.len();

    let child_rects: Vec<Rect> = span
        .children
        .iter()
        .filter_map(|child| place_frame(child, depth + 1, index, step_y, x_of, config, frames))
        .collect();

    let mut left = f64::MAX;
    let mut right = f64::MIN;
    for &filtered in &span.steps {
        let step = index.step(filtered);
        for id in [step.from.as_str(), step.to.as_str()] {
            let Some(&x) = x_of.get(id) else {
                continue;
            };
            left = left.min(x - config.block_padding_x);
            right = right.max(x + config.block_padding_x);
            if step.is_self_call() {
                right = right.max(x + config.self_call_width + config.block_padding_x);
            }
        }
    }
    if left > right {
        return None;
    }

    let mut top = step_y[first] - config.block_header_padding;
    let mut bottom = step_y[last] + config.block_footer_padding;
    for child in &child_rects {
        left = left.min(child.x - config.frame_inset);
        right = right.max(child.right() + config.frame_inset);
        top = top.min(child.y - config.block_header_padding);
        bottom = bottom.max(child.bottom() + config.block_footer_padding);
    }

    let block = span.block;
    let header = format!("{} {}", block.kind.keyword(), block.label);
    right = right.max(left + config.text_width(header.trim()) + 2.0 * config.block_padding_x);

    let dividers = span
        .branches
        .iter()
        .filter_map(|branch| {
            let branch_first = branch.first?;
            let y = if branch_first > first {
                (step_y[branch_first - 1] + step_y[branch_first]) / 2.0
            } else {
                step_y[branch_first] - config.branch_padding / 2.0
            };
            Some(FrameDivider {
                label: branch.label.map(str::to_string),
                is_else: branch.label.is_none(),
                y,
            })
        })
        .collect();

    let rect = Rect::from_edges(left, top, right, bottom);
    trace!(kind = block.kind.keyword(), depth, top, bottom, "Placed frame");
    frames.insert(
        slot,
        BlockFrame {
            kind: block.kind,
            label: block.label.clone(),
            line_number: block.line_number,
            depth,
            rect,
            dividers,
        },
    );
    Some(rect)
}

#[cfg(test)]
mod tests {
    use crate::core::{LayoutAlgorithm, Parser};
    use crate::plugins::sequence::{
        BlockKind, SequenceDatabase, SequenceLayoutAlgorithm, SequenceLayoutResult, SequenceParser,
        ViewState,
    };

    fn layout(input: &str, view: ViewState) -> SequenceLayoutResult {
        let mut db = SequenceDatabase::new();
        SequenceParser::new().parse(input, &mut db).unwrap();
        SequenceLayoutAlgorithm::new().with_view(view).layout(&db).unwrap()
    }

    #[test]
    fn test_single_frame_wraps_its_steps() {
        let result = layout("if ready\n  A -> B: go : ok", ViewState::default());
        assert_eq!(result.frames.len(), 1);
        let frame = &result.frames[0];
        assert_eq!(frame.kind, BlockKind::If);
        assert_eq!(frame.label, "ready");
        assert!(frame.rect.y < result.steps[0].y);
        assert!(frame.rect.bottom() > result.steps[1].y);
        for participant in &result.participants {
            assert!(frame.rect.x < participant.x && frame.rect.right() > participant.x);
        }
    }

    #[test]
    fn test_nested_frames_are_contained() {
        let input = "loop retry\n  A -> B: outer\n  if ok\n    B -> C: inner";
        let result = layout(input, ViewState::default());
        assert_eq!(result.frames.len(), 2);
        let (outer, inner) = (&result.frames[0], &result.frames[1]);
        assert_eq!((outer.depth, inner.depth), (0, 1));
        assert_eq!(outer.kind, BlockKind::Loop);
        assert!(outer.rect.x < inner.rect.x);
        assert!(outer.rect.right() > inner.rect.right());
        assert!(outer.rect.y < inner.rect.y);
        assert!(outer.rect.bottom() > inner.rect.bottom());
    }

    #[test]
    fn test_frames_sharing_a_first_step_do_not_overlap_headers() {
        let input = "if a\n  if b\n    A -> B: x";
        let result = layout(input, ViewState::default());
        let (outer, inner) = (&result.frames[0], &result.frames[1]);
        assert!(outer.rect.y < inner.rect.y);
        assert!(outer.rect.bottom() > inner.rect.bottom());
    }

    #[test]
    fn test_else_dividers() {
        let input = "if a\n  A -> B: one\nelse if b\n  A -> B: two\nelse\n  A -> B: three";
        let result = layout(input, ViewState::default());
        let frame = &result.frames[0];
        assert_eq!(frame.dividers.len(), 2);
        assert_eq!(frame.dividers[0].label.as_deref(), Some("b"));
        assert!(!frame.dividers[0].is_else);
        assert!(frame.dividers[1].is_else);

        let ys: Vec<f64> = result.steps.iter().map(|s| s.y).collect();
        assert!(frame.dividers[0].y > ys[0] && frame.dividers[0].y < ys[1]);
        assert!(frame.dividers[1].y > ys[1] && frame.dividers[1].y < ys[2]);
    }

    #[test]
    fn test_collapsed_block_has_no_frame() {
        let input = "== Hidden ==\nloop poll\n  A -> B: tick";
        let result = layout(input, ViewState::new().with_collapsed_section(0));
        assert!(result.frames.is_empty());
        assert!(result.steps.is_empty());
    }
}
