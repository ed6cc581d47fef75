//! Tideline - Lay out text-described sequence diagrams
//!
//! A library for parsing a small indentation-aware sequence diagram language
//! and turning it into positioned geometry (lifelines, arrows, activations,
//! block frames, sections, notes and groups) ready for any renderer.
//!
//! # Quick Start
//!
//! ```rust
//! use tideline::layout;
//!
//! let input = "User -> API: login : token\nAPI -> DB: lookup";
//! let result = layout(input).unwrap();
//! assert_eq!(result.participants.len(), 3);
//! ```
//!
//! # Advanced Usage
//!
//! For more control, use the individual components:
//!
//! ```rust
//! use tideline::prelude::*;
//!
//! let input = "== Login ==\nUser -> API: login\n== Browse ==\nUser -> API: list";
//!
//! // Parse into a database
//! let parser = SequenceParser::new();
//! let mut database = SequenceDatabase::new();
//! parser.parse(input, &mut database).unwrap();
//!
//! // Access the parsed data
//! assert_eq!(database.message_count(), 2);
//! assert_eq!(database.participant("User").unwrap().participant_type, ParticipantType::Actor);
//!
//! // Lay out with the first section collapsed
//! let layout = SequenceLayoutAlgorithm::new().with_view(ViewState::new().with_collapsed_section(0));
//! let result = layout.layout(&database).unwrap();
//! assert_eq!(result.steps.len(), 1);
//! ```

pub mod core;
pub mod plugins;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Database, Detector, DiagramError, InlineSpan, LayoutAlgorithm, Parser, Rect, SpanStyle,
    };
    pub use crate::plugins::orchestrator::Orchestrator;
    pub use crate::plugins::sequence::{
        BlockKind, LayoutConfig, Message, NotePosition, Participant, ParticipantType,
        SequenceDatabase, SequenceDetector, SequenceElement, SequenceLayoutAlgorithm,
        SequenceLayoutResult, SequenceParser, StepKind, ViewState,
    };
}

/// Parse sequence diagram text into a database without laying it out
///
/// Useful when the same document will be laid out under several views.
///
/// # Example
/// ```rust
/// use tideline::parse;
///
/// let db = parse("Alice -> Bob: hello\nBob -> Carol: hi").unwrap();
/// assert_eq!(db.participant_count(), 3);
/// assert_eq!(db.message_count(), 2);
/// ```
pub fn parse(input: &str) -> anyhow::Result<plugins::sequence::SequenceDatabase> {
    use crate::plugins::orchestrator::Orchestrator;

    Orchestrator::with_sequence_plugins().parse(input)
}

/// Parse and lay out sequence diagram text with everything expanded
///
/// # Returns
/// * `Ok(SequenceLayoutResult)` - Positioned geometry for rendering
/// * `Err` - A [`DiagramError`] if the text is malformed
///
/// # Example
/// ```rust
/// use tideline::layout;
///
/// let result = layout("A -> B: request : response").unwrap();
/// assert_eq!(result.steps.len(), 2);
/// assert_eq!(result.activations.len(), 1);
/// ```
pub fn layout(input: &str) -> anyhow::Result<plugins::sequence::SequenceLayoutResult> {
    layout_with_view(input, &plugins::sequence::ViewState::default())
}

/// Parse and lay out sequence diagram text under a view
///
/// # Example
/// ```rust
/// use tideline::layout_with_view;
/// use tideline::plugins::sequence::ViewState;
///
/// let view = ViewState::new().with_notes_hidden();
/// let result = layout_with_view("A -> B: hi\nnote: later", &view).unwrap();
/// assert!(result.notes.is_empty());
/// ```
pub fn layout_with_view(
    input: &str,
    view: &plugins::sequence::ViewState,
) -> anyhow::Result<plugins::sequence::SequenceLayoutResult> {
    use crate::plugins::orchestrator::Orchestrator;

    let orchestrator = Orchestrator::with_sequence_plugins();
    let database = orchestrator.parse(input)?;
    orchestrator.relayout(&database, view)
}
