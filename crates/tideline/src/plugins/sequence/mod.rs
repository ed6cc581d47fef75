//! Sequence diagram plugin
//!
//! Parses the indentation-aware sequence DSL into a [`SequenceDatabase`],
//! linearises messages into call/return steps and lays everything out as
//! positioned geometry.
//!
//! Syntax examples:
//! ```text
//! chart: sequence
//! title: Checkout
//!
//! User is an actor
//! Orders is a service aka "Order Service"
//!
//! User -> Orders: place order : order id
//! if card accepted
//!   Orders ~> Mailer: send receipt
//! else
//!   Orders -> User: declined
//! note right of Orders: retries are **idempotent**
//! ```

mod database;
mod detector;
mod frames;
mod indent;
mod inference;
mod labels;
mod layout;
mod notes;
mod ordering;
mod parser;
mod statement;
mod timeline;
mod view;

pub use database::{
    message_indices, Block, BlockKind, ElseIfBranch, Group, Message, Note, NotePosition,
    Participant, ParticipantType, Section, SequenceDatabase, SequenceElement,
};
pub use detector::{has_arrow_like, SequenceDetector};
pub use frames::{BlockFrame, FrameDivider};
pub use indent::{measure_indent, TAB_WIDTH};
pub use inference::{infer_participant_type, rule_count};
pub use labels::split_return_label;
pub use layout::{
    ActivationBox, GroupBox, LayoutConfig, PositionedParticipant, PositionedStep, SectionBand,
    SequenceLayoutAlgorithm, SequenceLayoutResult,
};
pub use notes::NoteBox;
pub use ordering::{apply_positions, order_participants};
pub use parser::SequenceParser;
pub use statement::{parse_message_statement, MessageStatement};
pub use timeline::{build_render_sequence, compute_activations, Activation, RenderStep, StepKind};
pub use view::ViewState;
