//! Sequence diagram layout algorithm
//!
//! Assigns coordinates to participants, render steps, activations, block
//! frames, section bands, notes and group boxes. Layout never mutates the
//! database: collapse state comes from a [`ViewState`] and the whole pass is
//! re-run when it changes.
//!
//! Y positions come from a single forward pass over the visible steps, so a
//! collapsed section only shifts what comes after it.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, span, trace, Level};

use super::database::{ParticipantType, SequenceDatabase};
use super::frames::{block_spans, layout_frames, BlockFrame, PaddingCounts};
use super::notes::{layout_notes, NoteBox};
use super::ordering::order_participants;
use super::timeline::{build_render_sequence, compute_activations, RenderStep, StepKind};
use super::view::ViewState;
use crate::core::{estimate_width, DiagramError, LayoutAlgorithm, Rect};

/// Geometric constants used by the layout pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Vertical distance between consecutive visible steps
    pub step_spacing: f64,
    /// Y of the first step when nothing precedes it
    pub header_height: f64,
    pub participant_height: f64,
    pub participant_gap: f64,
    pub min_participant_width: f64,
    pub participant_padding: f64,
    /// Horizontal room kept around message labels
    pub message_label_padding: f64,
    /// Horizontal extent of a self-call loop
    pub self_call_width: f64,
    pub block_header_padding: f64,
    pub branch_padding: f64,
    pub block_footer_padding: f64,
    pub block_padding_x: f64,
    /// Extra horizontal room an outer frame keeps around a nested one
    pub frame_inset: f64,
    pub section_padding_top: f64,
    pub section_padding_bottom: f64,
    pub note_offset: f64,
    pub note_gap: f64,
    pub note_padding: f64,
    pub note_line_height: f64,
    pub note_max_chars: usize,
    pub note_margin: f64,
    pub fold_size: f64,
    pub collapsed_note_size: f64,
    pub activation_width: f64,
    pub activation_depth_offset: f64,
    /// Average rendered width of one text column
    pub avg_char_width: f64,
    pub group_padding: f64,
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            step_spacing: 40.0,
            header_height: 80.0,
            participant_height: 40.0,
            participant_gap: 40.0,
            min_participant_width: 80.0,
            participant_padding: 12.0,
            message_label_padding: 16.0,
            self_call_width: 30.0,
            block_header_padding: 28.0,
            branch_padding: 24.0,
            block_footer_padding: 12.0,
            block_padding_x: 24.0,
            frame_inset: 8.0,
            section_padding_top: 24.0,
            section_padding_bottom: 24.0,
            note_offset: 10.0,
            note_gap: 8.0,
            note_padding: 8.0,
            note_line_height: 16.0,
            note_max_chars: 32,
            note_margin: 12.0,
            fold_size: 10.0,
            collapsed_note_size: 16.0,
            activation_width: 10.0,
            activation_depth_offset: 5.0,
            avg_char_width: 7.0,
            group_padding: 12.0,
            margin: 20.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_step_spacing(mut self, step_spacing: f64) -> Self {
        self.step_spacing = step_spacing;
        self
    }

    pub fn with_avg_char_width(mut self, avg_char_width: f64) -> Self {
        self.avg_char_width = avg_char_width;
        self
    }

    pub fn with_participant_gap(mut self, participant_gap: f64) -> Self {
        self.participant_gap = participant_gap;
        self
    }

    pub fn with_note_max_chars(mut self, note_max_chars: usize) -> Self {
        self.note_max_chars = note_max_chars;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub(crate) fn text_width(&self, text: &str) -> f64 {
        estimate_width(text, self.avg_char_width)
    }
}

/// Positioned participant for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedParticipant {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub participant_type: ParticipantType,
    /// Lifeline x
    pub x: f64,
    pub width: f64,
    /// Header box
    pub rect: Rect,
}

/// Positioned render step (an arrow)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedStep {
    /// Index into the unfiltered render sequence
    pub step: usize,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub from: String,
    pub to: String,
    pub label: String,
    pub message_index: usize,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub y: f64,
    /// Arrow start, snapped to an activation edge where one is open
    pub from_x: f64,
    /// Arrow end, snapped to an activation edge where one is open
    pub to_x: f64,
}

/// Activation rectangle on a lifeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationBox {
    pub participant_id: String,
    pub start_step: usize,
    pub end_step: usize,
    pub depth: usize,
    pub rect: Rect,
}

impl ActivationBox {
    fn covers(&self, participant: &str, step: usize) -> bool {
        self.participant_id == participant && (self.start_step..=self.end_step).contains(&step)
    }
}

/// Horizontal section divider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBand {
    pub index: usize,
    pub label: String,
    pub color: Option<String>,
    pub collapsed: bool,
    pub message_count: usize,
    pub y: f64,
    pub x: f64,
    pub width: f64,
}

/// Box drawn around the members of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBox {
    pub name: String,
    pub color: Option<String>,
    pub participant_ids: Vec<String>,
    pub rect: Rect,
}

/// Layout result containing all positioned elements
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceLayoutResult {
    pub title: Option<String>,
    pub participants: Vec<PositionedParticipant>,
    pub steps: Vec<PositionedStep>,
    pub activations: Vec<ActivationBox>,
    pub frames: Vec<BlockFrame>,
    pub sections: Vec<SectionBand>,
    pub notes: Vec<NoteBox>,
    pub groups: Vec<GroupBox>,
    /// Y where lifelines begin (bottom of the header boxes)
    pub lifeline_top: f64,
    pub width: f64,
    pub height: f64,
}

impl SequenceLayoutResult {
    fn empty(title: Option<String>) -> Self {
        Self {
            title,
            participants: Vec::new(),
            steps: Vec::new(),
            activations: Vec::new(),
            frames: Vec::new(),
            sections: Vec::new(),
            notes: Vec::new(),
            groups: Vec::new(),
            lifeline_top: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Y of a visible step by its unfiltered index
    pub fn step_y(&self, step: usize) -> Option<f64> {
        self.steps.iter().find(|s| s.step == step).map(|s| s.y)
    }

    fn shift_x(&mut self, dx: f64) {
        for participant in &mut self.participants {
            participant.x += dx;
            participant.rect.x += dx;
        }
        for step in &mut self.steps {
            step.from_x += dx;
            step.to_x += dx;
        }
        for activation in &mut self.activations {
            activation.rect.x += dx;
        }
        for frame in &mut self.frames {
            frame.rect.x += dx;
        }
        for note in &mut self.notes {
            note.rect.x += dx;
            if let Some(fold) = note.fold.as_mut() {
                fold.x += dx;
            }
        }
        for group in &mut self.groups {
            group.rect.x += dx;
        }
    }

    /// Leftmost and rightmost x of everything drawn
    fn horizontal_extent(&self) -> (f64, f64) {
        let rects = self
            .participants
            .iter()
            .map(|p| p.rect)
            .chain(self.activations.iter().map(|a| a.rect))
            .chain(self.frames.iter().map(|f| f.rect))
            .chain(self.notes.iter().map(|n| n.rect))
            .chain(self.groups.iter().map(|g| g.rect));
        rects.fold((f64::MAX, f64::MIN), |(left, right), rect| {
            (left.min(rect.x), right.max(rect.right()))
        })
    }
}

/// Render steps with their visibility under a view
///
/// Steps are addressed two ways: by unfiltered index into the full render
/// sequence, and by filtered index into the visible subsequence. Y
/// coordinates are assigned per filtered index.
pub(crate) struct StepIndex {
    steps: Vec<RenderStep>,
    visible: Vec<usize>,
    call_steps: Vec<Option<usize>>,
    by_message: Vec<Vec<usize>>,
}

impl StepIndex {
    fn new(db: &SequenceDatabase, view: &ViewState) -> Self {
        let steps = build_render_sequence(db.messages());
        let hidden: Vec<bool> = (0..db.message_count())
            .map(|message| {
                db.section_of_message(message)
                    .is_some_and(|section| view.is_section_collapsed(section))
            })
            .collect();

        let mut visible = Vec::new();
        let mut call_steps = vec![None; db.message_count()];
        let mut by_message = vec![Vec::new(); db.message_count()];
        for (index, step) in steps.iter().enumerate() {
            let message = step.message_index;
            if step.is_call() {
                if let Some(slot) = call_steps.get_mut(message) {
                    *slot = Some(index);
                }
            }
            let unlabeled_return = step.kind == StepKind::Return && step.label.is_empty();
            if hidden.get(message).copied().unwrap_or(false) || unlabeled_return {
                continue;
            }
            if let Some(list) = by_message.get_mut(message) {
                list.push(visible.len());
            }
            visible.push(index);
        }

        Self {
            steps,
            visible,
            call_steps,
            by_message,
        }
    }

    /// Number of visible steps
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn steps(&self) -> &[RenderStep] {
        &self.steps
    }

    /// Visible step by filtered index
    pub fn step(&self, filtered: usize) -> &RenderStep {
        &self.steps[self.visible[filtered]]
    }

    /// Unfiltered index of a visible step
    pub fn unfiltered(&self, filtered: usize) -> usize {
        self.visible[filtered]
    }

    /// Unfiltered index of a message's call step
    pub fn call_step(&self, message: usize) -> Option<usize> {
        self.call_steps.get(message).copied().flatten()
    }

    /// Filtered indices of a message's visible steps
    pub fn visible_steps_of(&self, message: usize) -> &[usize] {
        self.by_message
            .get(message)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Visible steps of a message that occur before the next message is sent
    pub fn own_steps_of(&self, message: usize) -> impl Iterator<Item = usize> + '_ {
        let bound = self.call_step(message + 1).unwrap_or(usize::MAX);
        self.visible_steps_of(message)
            .iter()
            .copied()
            .filter(move |&filtered| self.visible[filtered] < bound)
    }

    /// First visible step at or after an unfiltered index
    pub fn first_visible_from(&self, unfiltered: usize) -> Option<usize> {
        let filtered = self.visible.partition_point(|&index| index < unfiltered);
        (filtered < self.visible.len()).then_some(filtered)
    }

    /// Last visible step strictly before an unfiltered index
    pub fn last_visible_before(&self, unfiltered: usize) -> Option<usize> {
        self.visible
            .partition_point(|&index| index < unfiltered)
            .checked_sub(1)
    }

    pub fn is_visible(&self, unfiltered: usize) -> Option<usize> {
        self.visible.binary_search(&unfiltered).ok()
    }
}

/// Result of the vertical pass
struct VerticalLayout {
    step_y: Vec<f64>,
    section_y: Vec<f64>,
    end_y: f64,
}

/// Sequence diagram layout algorithm
pub struct SequenceLayoutAlgorithm {
    config: LayoutConfig,
    view: ViewState,
}

impl SequenceLayoutAlgorithm {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
            view: ViewState::default(),
        }
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            view: ViewState::default(),
        }
    }

    pub fn with_view(mut self, view: ViewState) -> Self {
        self.view = view;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Lifeline x for every participant, keyed by id, plus header boxes
    fn position_participants(&self, db: &SequenceDatabase) -> Vec<PositionedParticipant> {
        let config = &self.config;
        let order = order_participants(db);
        let participants: Vec<_> = order.iter().map(|&i| &db.participants()[i]).collect();
        let slot_of: HashMap<&str, usize> = participants
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.id.as_str(), slot))
            .collect();

        let widths: Vec<f64> = participants
            .iter()
            .map(|p| {
                (config.text_width(&p.label) + 2.0 * config.participant_padding)
                    .max(config.min_participant_width)
            })
            .collect();

        // Widen gaps so message labels fit between the lifelines they span
        let mut gaps = vec![config.participant_gap; participants.len()];
        for message in db.messages() {
            let (Some(&from), Some(&to)) = (
                slot_of.get(message.from.as_str()),
                slot_of.get(message.to.as_str()),
            ) else {
                continue;
            };
            let label_width = config
                .text_width(&message.label)
                .max(config.text_width(message.return_label.as_deref().unwrap_or_default()))
                + 2.0 * config.message_label_padding;

            if from == to {
                let needed = label_width + config.self_call_width - widths[from] / 2.0;
                if from + 1 < gaps.len() {
                    gaps[from] = gaps[from].max(needed);
                }
                continue;
            }

            let (left, right) = (from.min(to), from.max(to));
            let span = widths[left] / 2.0
                + widths[right] / 2.0
                + gaps[left..right].iter().sum::<f64>()
                + widths[left + 1..right].iter().sum::<f64>();
            if label_width > span {
                let per_slot = (label_width - span) / (right - left) as f64;
                for gap in &mut gaps[left..right] {
                    *gap = gap.max(config.participant_gap + per_slot);
                }
            }
        }

        let mut positioned = Vec::with_capacity(participants.len());
        let mut cursor = config.margin;
        for (slot, participant) in participants.iter().enumerate() {
            let width = widths[slot];
            let x = cursor + width / 2.0;
            positioned.push(PositionedParticipant {
                id: participant.id.clone(),
                label: participant.label.clone(),
                participant_type: participant.participant_type,
                x,
                width,
                rect: Rect::new(cursor, config.margin, width, config.participant_height),
            });
            cursor += width + gaps[slot];
        }
        positioned
    }

    /// Single forward pass assigning a Y to every visible step and section
    fn assign_y(
        &self,
        db: &SequenceDatabase,
        index: &StepIndex,
        paddings: &PaddingCounts,
    ) -> VerticalLayout {
        let config = &self.config;
        let count = index.len();

        // Sections anchor to the call step of the first message they own,
        // or of the next message when empty
        let mut sections_at: Vec<Vec<usize>> = vec![Vec::new(); count + 1];
        for (section_index, section) in db.sections().iter().enumerate() {
            let target = index
                .call_step(section.first_message_index)
                .and_then(|unfiltered| index.first_visible_from(unfiltered))
                .unwrap_or(count);
            sections_at[target].push(section_index);
        }

        let mut section_y = vec![0.0; db.sections().len()];
        let mut step_y = Vec::with_capacity(count);
        let mut y = config.header_height;

        for filtered in 0..=count {
            y += paddings.footers[filtered] as f64 * config.block_footer_padding;
            for &section_index in &sections_at[filtered] {
                y += config.section_padding_top;
                section_y[section_index] = y;
                y += config.section_padding_bottom;
            }
            if filtered == count {
                break;
            }
            y += paddings.headers[filtered] as f64 * config.block_header_padding;
            y += paddings.branches[filtered] as f64 * config.branch_padding;

            trace!(step = index.unfiltered(filtered), y, "Placed step");
            step_y.push(y);
            y += config.step_spacing;
        }

        VerticalLayout {
            step_y,
            section_y,
            end_y: y,
        }
    }

    fn activation_boxes(
        &self,
        index: &StepIndex,
        step_y: &[f64],
        x_of: &HashMap<&str, f64>,
    ) -> Vec<ActivationBox> {
        let config = &self.config;
        compute_activations(index.steps())
            .into_iter()
            .filter_map(|activation| {
                let top_step = index
                    .first_visible_from(activation.start_step)
                    .filter(|&filtered| index.unfiltered(filtered) <= activation.end_step)?;
                let top = step_y[top_step];
                let bottom = match index.is_visible(activation.end_step) {
                    Some(filtered) => step_y[filtered],
                    None => {
                        let last = index.last_visible_before(activation.end_step)?;
                        step_y[last] + config.step_spacing / 2.0
                    }
                };

                let center = x_of.get(activation.participant_id.as_str())?
                    + activation.depth as f64 * config.activation_depth_offset;
                let rect = Rect::new(
                    center - config.activation_width / 2.0,
                    top,
                    config.activation_width,
                    bottom - top,
                );
                Some(ActivationBox {
                    participant_id: activation.participant_id,
                    start_step: activation.start_step,
                    end_step: activation.end_step,
                    depth: activation.depth,
                    rect,
                })
            })
            .collect()
    }

    /// Endpoint x for one side of an arrow
    ///
    /// Snaps to the edge of the innermost activation covering the step,
    /// facing the other participant. `skip` excludes an activation the step
    /// itself opens or closes on this side.
    fn endpoint_x(
        activations: &[ActivationBox],
        participant: &str,
        step: usize,
        skip: impl Fn(&ActivationBox) -> bool,
        lifeline_x: f64,
        other_x: f64,
        self_call: bool,
    ) -> f64 {
        let innermost = activations
            .iter()
            .filter(|a| a.covers(participant, step) && !skip(a))
            .max_by_key(|a| a.depth);
        match innermost {
            Some(activation) if !self_call && other_x < lifeline_x => activation.rect.x,
            Some(activation) => activation.rect.right(),
            None => lifeline_x,
        }
    }

    fn positioned_steps(
        &self,
        index: &StepIndex,
        step_y: &[f64],
        x_of: &HashMap<&str, f64>,
        activations: &[ActivationBox],
    ) -> Result<Vec<PositionedStep>> {
        let lookup = |id: &str| {
            x_of.get(id).copied().ok_or_else(|| {
                DiagramError::layout_error(format!("Participant '{}' has no position", id))
            })
        };

        let mut positioned = Vec::with_capacity(index.len());
        for (filtered, &y) in step_y.iter().enumerate() {
            let step = index.step(filtered);
            let unfiltered = index.unfiltered(filtered);
            let from_lifeline = lookup(&step.from)?;
            let to_lifeline = lookup(&step.to)?;
            let self_call = step.is_self_call();

            positioned.push(PositionedStep {
                step: unfiltered,
                kind: step.kind,
                from: step.from.clone(),
                to: step.to.clone(),
                label: step.label.clone(),
                message_index: step.message_index,
                is_async: step.is_async,
                y,
                from_x: Self::endpoint_x(
                    activations,
                    &step.from,
                    unfiltered,
                    |a| step.is_call() && a.start_step == unfiltered,
                    from_lifeline,
                    to_lifeline,
                    self_call,
                ),
                to_x: Self::endpoint_x(
                    activations,
                    &step.to,
                    unfiltered,
                    |a| !step.is_call() && a.end_step == unfiltered,
                    to_lifeline,
                    from_lifeline,
                    self_call,
                ),
            });
        }
        Ok(positioned)
    }

    fn group_boxes(
        &self,
        db: &SequenceDatabase,
        participants: &[PositionedParticipant],
        height: f64,
    ) -> Vec<GroupBox> {
        let padding = self.config.group_padding;
        db.groups()
            .iter()
            .filter_map(|group| {
                let members: Vec<&PositionedParticipant> = participants
                    .iter()
                    .filter(|p| group.participant_ids.contains(&p.id))
                    .collect();
                let left = members.iter().map(|p| p.rect.x).reduce(f64::min)?;
                let right = members.iter().map(|p| p.rect.right()).reduce(f64::max)?;
                Some(GroupBox {
                    name: group.name.clone(),
                    color: group.color.clone(),
                    participant_ids: group.participant_ids.clone(),
                    rect: Rect::from_edges(left - padding, 0.0, right + padding, height),
                })
            })
            .collect()
    }

    /// Lay out a document under a view other than the configured one
    pub fn layout_with_view(
        &self,
        database: &SequenceDatabase,
        view: &ViewState,
    ) -> Result<SequenceLayoutResult> {
        let layout_span = span!(
            Level::INFO,
            "layout_sequence",
            participant_count = database.participant_count(),
            message_count = database.message_count(),
        );
        let _enter = layout_span.enter();

        if let Some(error) = database.error() {
            return Err(DiagramError::layout_error(format!(
                "cannot lay out a document that failed to parse: {}",
                error
            ))
            .into());
        }

        let title = database.title().map(str::to_string);
        if database.participant_count() == 0 {
            debug!("Empty database, returning empty layout");
            return Ok(SequenceLayoutResult::empty(title));
        }

        let config = &self.config;
        let participants = self.position_participants(database);
        let x_of: HashMap<&str, f64> = participants.iter().map(|p| (p.id.as_str(), p.x)).collect();

        let index = StepIndex::new(database, view);
        let spans = block_spans(database.elements(), &index);
        let paddings = PaddingCounts::from_spans(&spans, index.len());
        let vertical = self.assign_y(database, &index, &paddings);
        debug!(
            step_count = index.steps().len(),
            visible_step_count = index.len(),
            "Assigned step positions"
        );

        let activations = self.activation_boxes(&index, &vertical.step_y, &x_of);
        let steps = self.positioned_steps(&index, &vertical.step_y, &x_of, &activations)?;
        let frames = layout_frames(&spans, &index, &vertical.step_y, &x_of, config);
        let notes = layout_notes(database, &index, &vertical.step_y, &x_of, view, config);
        debug!(
            activation_count = activations.len(),
            frame_count = frames.len(),
            note_count = notes.len(),
            "Positioned timeline elements"
        );

        let notes_bottom = notes
            .iter()
            .map(|n| n.rect.bottom() + config.margin)
            .fold(f64::MIN, f64::max);
        let height = vertical.end_y.max(notes_bottom);

        let sections = database
            .sections()
            .iter()
            .enumerate()
            .map(|(section_index, section)| SectionBand {
                index: section_index,
                label: section.label.clone(),
                color: section.color.clone(),
                collapsed: view.is_section_collapsed(section_index),
                message_count: database.section_messages(section_index).len(),
                y: vertical.section_y[section_index],
                x: 0.0,
                width: 0.0,
            })
            .collect();

        let groups = self.group_boxes(database, &participants, height);
        let mut result = SequenceLayoutResult {
            title,
            participants,
            steps,
            activations,
            frames,
            sections,
            notes,
            groups,
            lifeline_top: config.margin + config.participant_height,
            width: 0.0,
            height,
        };

        let (left, _) = result.horizontal_extent();
        if left < config.margin {
            result.shift_x(config.margin - left);
        }
        let (left, right) = result.horizontal_extent();
        result.width = right + config.margin;
        for band in &mut result.sections {
            band.x = left;
            band.width = right - left;
        }

        info!(
            participant_count = result.participants.len(),
            step_count = result.steps.len(),
            width = result.width,
            height = result.height,
            "Layout completed"
        );
        Ok(result)
    }
}

impl Default for SequenceLayoutAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutAlgorithm<SequenceDatabase> for SequenceLayoutAlgorithm {
    type Output = SequenceLayoutResult;

    fn layout(&self, database: &SequenceDatabase) -> Result<Self::Output> {
        self.layout_with_view(database, &self.view)
    }

    fn name(&self) -> &'static str {
        "timeline"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }
}
