//! Sequence diagram database implementation
//!
//! Stores the parsed document: participants, the flat message list, the
//! ordered element tree (messages, blocks, sections, notes), groups and
//! header options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;

use crate::core::{Database, DiagramError};

/// Shape category of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantType {
    #[default]
    Default,
    Service,
    Database,
    Actor,
    Queue,
    Cache,
    Gateway,
    External,
    Networking,
    Frontend,
}

impl ParticipantType {
    /// All known types, in declaration order
    pub const ALL: [ParticipantType; 10] = [
        ParticipantType::Default,
        ParticipantType::Service,
        ParticipantType::Database,
        ParticipantType::Actor,
        ParticipantType::Queue,
        ParticipantType::Cache,
        ParticipantType::Gateway,
        ParticipantType::External,
        ParticipantType::Networking,
        ParticipantType::Frontend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantType::Default => "default",
            ParticipantType::Service => "service",
            ParticipantType::Database => "database",
            ParticipantType::Actor => "actor",
            ParticipantType::Queue => "queue",
            ParticipantType::Cache => "cache",
            ParticipantType::Gateway => "gateway",
            ParticipantType::External => "external",
            ParticipantType::Networking => "networking",
            ParticipantType::Frontend => "frontend",
        }
    }
}

impl fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ParticipantType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown participant type: {}", s))
    }
}

/// A participant (lifeline) in the sequence diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique identifier used in messages
    pub id: String,
    /// Display label (alias via `aka`, otherwise the id)
    pub label: String,
    #[serde(rename = "type")]
    pub participant_type: ParticipantType,
    pub line_number: usize,
    /// Explicit slot override; negative values count from the end
    pub position: Option<i64>,
}

impl Participant {
    pub fn new(id: impl Into<String>, participant_type: ParticipantType, line_number: usize) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            participant_type,
            line_number,
            position: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_position(mut self, position: Option<i64>) -> Self {
        self.position = position;
        self
    }
}

/// A message between participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Position in the flat message list
    pub index: usize,
    pub from: String,
    pub to: String,
    pub label: String,
    pub return_label: Option<String>,
    pub line_number: usize,
    #[serde(rename = "async")]
    pub is_async: bool,
}

impl Message {
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            index: 0,
            from: from.into(),
            to: to.into(),
            label: label.into(),
            return_label: None,
            line_number: 0,
            is_async: false,
        }
    }

    pub fn with_return_label(mut self, return_label: Option<String>) -> Self {
        self.return_label = return_label;
        self
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }

    pub fn is_self_call(&self) -> bool {
        self.from == self.to
    }
}

/// Kind of a control block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    If,
    Loop,
    Parallel,
}

impl BlockKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Loop => "loop",
            BlockKind::Parallel => "parallel",
        }
    }
}

/// One `else if` branch of an `if` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElseIfBranch {
    pub label: String,
    pub children: Vec<SequenceElement>,
    pub line_number: usize,
}

/// An `if` / `loop` / `parallel` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub label: String,
    pub children: Vec<SequenceElement>,
    pub else_children: Vec<SequenceElement>,
    pub else_if_branches: Vec<ElseIfBranch>,
    pub line_number: usize,
}

impl Block {
    pub fn new(kind: BlockKind, label: impl Into<String>, line_number: usize) -> Self {
        Self {
            kind,
            label: label.into(),
            children: Vec::new(),
            else_children: Vec::new(),
            else_if_branches: Vec::new(),
            line_number,
        }
    }

    /// Indices of every message inside this block, nested blocks included
    pub fn message_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        collect_message_indices(&self.children, &mut indices);
        for branch in &self.else_if_branches {
            collect_message_indices(&branch.children, &mut indices);
        }
        collect_message_indices(&self.else_children, &mut indices);
        indices
    }
}

fn collect_message_indices(elements: &[SequenceElement], out: &mut Vec<usize>) {
    for element in elements {
        match element {
            SequenceElement::Message(message) => out.push(message.index),
            SequenceElement::Block(block) => out.extend(block.message_indices()),
            SequenceElement::Section(_) | SequenceElement::Note(_) => {}
        }
    }
}

/// Indices of every message in an element list, descending into blocks
pub fn message_indices(elements: &[SequenceElement]) -> Vec<usize> {
    let mut indices = Vec::new();
    collect_message_indices(elements, &mut indices);
    indices
}

/// A labelled horizontal divider owning the messages that follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub label: String,
    pub color: Option<String>,
    pub line_number: usize,
    /// Number of messages parsed before this section
    pub first_message_index: usize,
}

/// Which side of the lifeline a note sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotePosition {
    Left,
    #[default]
    Right,
}

/// A note attached to a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub text: String,
    pub position: NotePosition,
    pub participant_id: String,
    pub line_number: usize,
    /// Most recent message when the note was parsed
    pub after_message: Option<usize>,
}

/// A named box clustering participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    pub color: Option<String>,
    pub participant_ids: Vec<String>,
    pub line_number: usize,
}

/// One node of the ordered element tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SequenceElement {
    Message(Message),
    Block(Block),
    Section(Section),
    Note(Note),
}

/// Sequence diagram database (the parsed document)
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDatabase {
    title: Option<String>,
    participants: Vec<Participant>,
    messages: Vec<Message>,
    elements: Vec<SequenceElement>,
    groups: Vec<Group>,
    sections: Vec<Section>,
    options: BTreeMap<String, String>,
    error: Option<DiagramError>,
}

impl SequenceDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant, or update an existing one in place
    ///
    /// Updating keeps the participant's original slot in declaration order.
    pub fn add_participant(&mut self, participant: Participant) -> Result<()> {
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => {
                existing.label = participant.label;
                existing.participant_type = participant.participant_type;
                if participant.position.is_some() {
                    existing.position = participant.position;
                }
            }
            None => self.participants.push(participant),
        }
        Ok(())
    }

    /// Register a participant with the given type unless it already exists
    pub fn ensure_participant(
        &mut self,
        id: &str,
        participant_type: ParticipantType,
        line_number: usize,
    ) -> Result<()> {
        if !self.has_participant(id) {
            self.participants
                .push(Participant::new(id, participant_type, line_number));
        }
        Ok(())
    }

    /// Append a message to the flat list, assigning its index
    ///
    /// Participants named by the message are registered with the default
    /// type if missing; the parser registers them with inferred types first.
    pub fn add_message(&mut self, mut message: Message) -> Result<usize> {
        self.ensure_participant(&message.from, ParticipantType::Default, message.line_number)?;
        self.ensure_participant(&message.to, ParticipantType::Default, message.line_number)?;
        message.index = self.messages.len();
        let index = message.index;
        self.messages.push(message);
        Ok(index)
    }

    pub(crate) fn push_element(&mut self, element: SequenceElement) {
        self.elements.push(element);
    }

    pub(crate) fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub(crate) fn push_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub(crate) fn group_mut(&mut self, index: usize) -> Option<&mut Group> {
        self.groups.get_mut(index)
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub(crate) fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    pub(crate) fn set_error(&mut self, error: DiagramError) {
        self.error = Some(error);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Get all participants in declaration order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn has_participant(&self, id: &str) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Get all messages in document order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Top-level element tree
    pub fn elements(&self) -> &[SequenceElement] {
        &self.elements
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Sections in document order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn error(&self) -> Option<&DiagramError> {
        self.error.as_ref()
    }

    /// Group a participant belongs to, if any
    pub fn group_of(&self, participant_id: &str) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.participant_ids.iter().any(|id| id == participant_id))
    }

    /// Notes in document order, descending into blocks
    pub fn notes(&self) -> Vec<&Note> {
        fn walk<'a>(elements: &'a [SequenceElement], out: &mut Vec<&'a Note>) {
            for element in elements {
                match element {
                    SequenceElement::Note(note) => out.push(note),
                    SequenceElement::Block(block) => {
                        walk(&block.children, out);
                        for branch in &block.else_if_branches {
                            walk(&branch.children, out);
                        }
                        walk(&block.else_children, out);
                    }
                    SequenceElement::Message(_) | SequenceElement::Section(_) => {}
                }
            }
        }

        let mut notes = Vec::new();
        walk(&self.elements, &mut notes);
        notes
    }

    /// Section owning the given message, if any
    pub fn section_of_message(&self, message_index: usize) -> Option<usize> {
        self.sections
            .iter()
            .enumerate()
            .rev()
            .find(|(_, s)| s.first_message_index <= message_index)
            .map(|(i, _)| i)
    }

    /// Range of message indices owned by a section
    pub fn section_messages(&self, section_index: usize) -> std::ops::Range<usize> {
        let Some(section) = self.sections.get(section_index) else {
            return 0..0;
        };
        let end = self
            .sections
            .get(section_index + 1)
            .map(|next| next.first_message_index)
            .unwrap_or(self.messages.len());
        section.first_message_index..end.max(section.first_message_index)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Clear all data
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}

/// Database trait implementation for SequenceDatabase
///
/// Maps Participant to Node and Message to Edge for trait compatibility.
impl Database for SequenceDatabase {
    type Node = Participant;
    type Edge = Message;

    fn add_node(&mut self, node: Self::Node) -> Result<()> {
        self.add_participant(node)
    }

    fn add_edge(&mut self, edge: Self::Edge) -> Result<()> {
        let index = self.add_message(edge)?;
        let message = self.messages[index].clone();
        self.push_element(SequenceElement::Message(message));
        Ok(())
    }

    fn get_node(&self, id: &str) -> Option<&Self::Node> {
        self.participant(id)
    }

    fn nodes(&self) -> impl Iterator<Item = &Self::Node> {
        self.participants.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Self::Edge> {
        self.messages.iter()
    }

    fn clear(&mut self) {
        self.clear_all()
    }

    fn node_count(&self) -> usize {
        self.participant_count()
    }

    fn edge_count(&self) -> usize {
        self.message_count()
    }
}
