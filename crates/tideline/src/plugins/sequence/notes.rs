//! Note placement
//!
//! Notes float beside a lifeline next to the message they follow. They never
//! push steps down; notes that would overlap on the same side of the same
//! participant are stacked instead.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use super::database::{NotePosition, SequenceDatabase};
use super::layout::{LayoutConfig, StepIndex};
use super::view::ViewState;
use crate::core::{parse_inline_spans, spans_text, wrap_spans, InlineSpan, Rect};

/// Positioned note
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBox {
    /// Note index in document order
    pub index: usize,
    pub participant_id: String,
    pub position: NotePosition,
    pub line_number: usize,
    pub collapsed: bool,
    pub rect: Rect,
    /// Wrapped display lines as plain text, markup removed
    pub lines: Vec<String>,
    /// Inline spans per display line
    pub spans: Vec<Vec<InlineSpan>>,
    /// Folded corner; absent on collapsed notes
    pub fold: Option<Rect>,
}

/// Tokenize and wrap note text into styled display lines
///
/// Explicit line breaks are kept. Each source line is tokenized whole, then
/// wrapped on its visible text so styles carry across the break.
fn note_lines(text: &str, max_chars: usize) -> Vec<Vec<InlineSpan>> {
    text.split('\n')
        .flat_map(|line| wrap_spans(&parse_inline_spans(line.trim()), max_chars))
        .collect()
}

/// Place every visible note
pub(crate) fn layout_notes(
    db: &SequenceDatabase,
    index: &StepIndex,
    step_y: &[f64],
    x_of: &HashMap<&str, f64>,
    view: &ViewState,
    config: &LayoutConfig,
) -> Vec<NoteBox> {
    if !view.show_notes {
        return Vec::new();
    }

    let mut stack_bottom: HashMap<(&str, NotePosition), f64> = HashMap::new();
    let mut boxes = Vec::new();

    for (note_index, note) in db.notes().into_iter().enumerate() {
        let anchor = match note.after_message {
            None => config.header_height,
            Some(message) => match index.own_steps_of(message).last() {
                Some(filtered) => step_y[filtered],
                None => {
                    trace!(note = note_index, message, "Note follows a hidden message");
                    continue;
                }
            },
        };
        let Some(&lifeline_x) = x_of.get(note.participant_id.as_str()) else {
            trace!(note = note_index, participant = %note.participant_id, "Note without lifeline");
            continue;
        };

        let collapsed = view.is_note_collapsed(note_index);
        let spans = if collapsed {
            Vec::new()
        } else {
            note_lines(&note.text, config.note_max_chars)
        };
        let lines: Vec<String> = spans.iter().map(|line| spans_text(line)).collect();

        let (width, height) = if collapsed {
            (config.collapsed_note_size, config.collapsed_note_size)
        } else {
            let text_width = lines
                .iter()
                .map(|line| config.text_width(line))
                .fold(0.0, f64::max);
            (
                text_width + 2.0 * config.note_padding,
                lines.len() as f64 * config.note_line_height + 2.0 * config.note_padding,
            )
        };

        let key = (note.participant_id.as_str(), note.position);
        let mut top = anchor + config.note_offset;
        if let Some(&bottom) = stack_bottom.get(&key) {
            top = top.max(bottom + config.note_gap);
        }
        stack_bottom.insert(key, top + height);

        let x = match note.position {
            NotePosition::Right => lifeline_x + config.note_margin,
            NotePosition::Left => lifeline_x - config.note_margin - width,
        };
        let rect = Rect::new(x, top, width, height);
        let fold = (!collapsed).then(|| {
            Rect::new(
                rect.right() - config.fold_size,
                rect.y,
                config.fold_size,
                config.fold_size,
            )
        });

        boxes.push(NoteBox {
            index: note_index,
            participant_id: note.participant_id.clone(),
            position: note.position,
            line_number: note.line_number,
            collapsed,
            rect,
            lines,
            spans,
            fold,
        });
    }
    boxes
}
