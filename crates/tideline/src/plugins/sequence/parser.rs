//! Sequence diagram parser
//!
//! Parses the line-oriented sequence language into a [`SequenceDatabase`].
//! Each line is classified by an ordered list of rules (first match wins):
//!
//! 1. blank line
//! 2. `## Group(color)` heading
//! 3. `//` comment, or a bare `#` (rejected)
//! 4. `== Section(color) ==` divider
//! 5. `key: value` header option
//! 6. `Name is a <type> [aka Alias] [position N]`
//! 7. `Name position N`
//! 8. bare participant name inside an indented group body
//! 9. indentation-aware content: messages, blocks, `else`, notes
//!
//! Block membership follows indentation. Incomplete notes are skipped rather
//! than rejected so half-typed documents still parse.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::Result;
use regex::{Captures, Regex, RegexBuilder};
use tracing::{debug, error, info, span, trace, Level};

use super::database::{
    Block, BlockKind, ElseIfBranch, Group, Message, Note, NotePosition, Participant,
    ParticipantType, Section, SequenceDatabase, SequenceElement,
};
use super::detector::{has_arrow_like, SequenceDetector};
use super::indent::measure_indent;
use super::inference::infer_participant_type;
use super::labels::split_return_label;
use super::statement::{parse_message_statement, MessageStatement};
use crate::core::{Detector, DiagramError, Parser};

/// Line classification patterns, matched against the trimmed line
struct LinePatterns {
    group_heading: Regex,
    section: Regex,
    header: Regex,
    declaration: Regex,
    position: Regex,
    bare_name: Regex,
    block_open: Regex,
    else_if: Regex,
    else_only: Regex,
    note: Regex,
}

fn case_insensitive(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .expect("line patterns are valid regexes")
}

fn patterns() -> &'static LinePatterns {
    static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinePatterns {
        group_heading: case_insensitive(r"^##\s+(.+?)\s*(?:\(\s*([^)]*?)\s*\))?$"),
        section: case_insensitive(r"^==\s*(.+?)\s*(?:\(\s*([^)]*?)\s*\))?\s*(?:==)?$"),
        header: case_insensitive(r"^([A-Za-z_][\w.\-]*)\s*:\s*(.*)$"),
        declaration: case_insensitive(
            r"^([\w.\-]+)\s+is\s+an?\s+(\w+)(?:\s+aka\s+(.+?))?(?:\s+position\s+(-?\d+))?$",
        ),
        position: case_insensitive(r"^([\w.\-]+)\s+position\s+(-?\d+)$"),
        bare_name: case_insensitive(r"^[A-Za-z_][\w.\-]*$"),
        block_open: case_insensitive(r"^(if|loop|parallel)(?:\s+(.*))?$"),
        else_if: case_insensitive(r"^else\s+if(?:\s+(.*))?$"),
        else_only: case_insensitive(r"^else$"),
        note: case_insensitive(
            r"^note(?:\s+(left|right))?(?:\s+of\s+([^:]+?))?\s*(?::\s*(.*))?$",
        ),
    })
}

fn has_arrow(line: &str) -> bool {
    line.contains("->") || line.contains("~>")
}

/// Parse a `position` literal, saturating values outside the `i64` range
fn parse_position(digits: &str) -> i64 {
    digits.parse().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Strip one pair of matching surrounding quotes
fn unquote(text: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|&quote| {
            text.strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        })
        .unwrap_or(text)
}

/// Whether a color is written as a hex literal rather than a name
fn looks_like_hex(color: &str) -> bool {
    color.starts_with('#')
        || (matches!(color.len(), 3 | 6) && color.chars().all(|c| c.is_ascii_hexdigit()))
}

fn trimmed_group<'t>(captures: &Captures<'t>, index: usize) -> Option<&'t str> {
    captures
        .get(index)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Which container of an open block receives new elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Children,
    ElseIf,
    Else,
}

/// A block still accepting children, with the indent of its opening line
#[derive(Debug)]
struct OpenBlock {
    block: Block,
    indent: usize,
    branch: Branch,
}

impl OpenBlock {
    fn container(&mut self) -> &mut Vec<SequenceElement> {
        match self.branch {
            Branch::Children => &mut self.block.children,
            Branch::ElseIf => match self.block.else_if_branches.last_mut() {
                Some(branch) => &mut branch.children,
                None => &mut self.block.children,
            },
            Branch::Else => &mut self.block.else_children,
        }
    }
}

/// A `note` header without inline text, collecting its indented body
#[derive(Debug)]
struct PendingNote {
    participant: Option<String>,
    position: NotePosition,
    indent: usize,
    line_number: usize,
    after_message: Option<usize>,
    lines: Vec<String>,
}

/// Mutable state threaded through the line loop of a single parse
#[derive(Debug, Default)]
struct ParseContext {
    stack: Vec<OpenBlock>,
    active_group: Option<usize>,
    group_membership: HashMap<String, usize>,
    content_started: bool,
    saw_chart_header: bool,
    last_sender: Option<String>,
    pending_note: Option<PendingNote>,
}

impl ParseContext {
    fn parse_line(
        &mut self,
        db: &mut SequenceDatabase,
        raw: &str,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        if self.collect_note_body(db, raw) {
            return Ok(());
        }

        let indent = measure_indent(raw);
        let line = raw.trim();
        let p = patterns();

        if line.is_empty() {
            self.active_group = None;
            return Ok(());
        }

        if let Some(captures) = p.group_heading.captures(line) {
            return self.group_heading(db, &captures, line_number);
        }

        // Any non-indented line ends the group body
        if indent == 0 {
            self.active_group = None;
        }

        if line.starts_with("//") {
            return Ok(());
        }
        if line.starts_with('#') {
            return Err(DiagramError::structural(
                "Use '//' for comments; '#' is reserved for '## Group' headings",
                line_number,
            ));
        }

        if let Some(captures) = p.section.captures(line) {
            return self.section(db, &captures, indent, line_number);
        }

        if !has_arrow(line) {
            if !p.note.is_match(line) {
                if let Some(captures) = p.header.captures(line) {
                    return self.header(db, &captures, line_number);
                }
            }
            if let Some(captures) = p.declaration.captures(line) {
                return self.declaration(db, &captures, line_number);
            }
            if let Some(captures) = p.position.captures(line) {
                return self.position_override(db, &captures, line_number);
            }
            if indent > 0 && self.active_group.is_some() && p.bare_name.is_match(line) {
                trace!(line_number, participant = line, "Group member");
                db.ensure_participant(line, infer_participant_type(line), line_number)
                    .map_err(|e| DiagramError::structural(e.to_string(), line_number))?;
                return self.join_active_group(db, line, line_number);
            }
        }

        self.content(db, line, indent, line_number)
    }

    fn group_heading(
        &mut self,
        db: &mut SequenceDatabase,
        captures: &Captures<'_>,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        if self.content_started {
            return Err(DiagramError::structural(
                "Group headings must appear before any content",
                line_number,
            ));
        }

        let name = captures[1].trim();
        let color = trimmed_group(captures, 2);
        if let Some(color) = color.filter(|c| looks_like_hex(c)) {
            return Err(DiagramError::structural(
                format!("Group color '{}' must be a named color, not a hex value", color),
                line_number,
            ));
        }

        let index = match db.groups().iter().position(|g| g.name == name) {
            Some(index) => {
                if let (Some(color), Some(group)) = (color, db.group_mut(index)) {
                    group.color = Some(color.to_string());
                }
                index
            }
            None => {
                db.push_group(Group {
                    name: name.to_string(),
                    color: color.map(str::to_string),
                    participant_ids: Vec::new(),
                    line_number,
                });
                db.groups().len() - 1
            }
        };
        trace!(line_number, group = name, "Group heading");
        self.active_group = Some(index);
        Ok(())
    }

    fn section(
        &mut self,
        db: &mut SequenceDatabase,
        captures: &Captures<'_>,
        indent: usize,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        let label = captures[1].trim();
        let color = trimmed_group(captures, 2);
        if let Some(color) = color.filter(|c| looks_like_hex(c)) {
            return Err(DiagramError::structural(
                format!("Section color '{}' must be a named color, not a hex value", color),
                line_number,
            ));
        }

        self.close_blocks(db, indent, false);
        self.content_started = true;

        let section = Section {
            label: label.to_string(),
            color: color.map(str::to_string),
            line_number,
            first_message_index: db.message_count(),
        };
        trace!(line_number, section = label, "Section divider");
        db.push_section(section.clone());
        self.append(db, SequenceElement::Section(section));
        Ok(())
    }

    fn header(
        &mut self,
        db: &mut SequenceDatabase,
        captures: &Captures<'_>,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        let key = captures[1].to_lowercase();
        let value = captures[2].trim();

        if key == "chart" {
            if !value.eq_ignore_ascii_case("sequence") {
                return Err(DiagramError::structural(
                    format!("Unsupported chart type '{}'; expected 'sequence'", value),
                    line_number,
                ));
            }
            self.saw_chart_header = true;
            return Ok(());
        }

        if self.content_started {
            return Err(DiagramError::structural(
                format!("Option '{}' must appear before content", key),
                line_number,
            ));
        }

        trace!(line_number, key = %key, value, "Header option");
        if key == "title" {
            db.set_title(value);
        } else {
            db.set_option(key, value);
        }
        Ok(())
    }

    fn declaration(
        &mut self,
        db: &mut SequenceDatabase,
        captures: &Captures<'_>,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        let id = captures[1].trim();
        let participant_type: ParticipantType = captures[2].parse().unwrap_or_default();
        let alias = trimmed_group(captures, 3).map(unquote);
        let position = captures.get(4).map(|m| parse_position(m.as_str()));

        trace!(line_number, participant = id, %participant_type, "Participant declaration");
        let participant = Participant::new(id, participant_type, line_number)
            .with_label(alias.unwrap_or(id))
            .with_position(position);
        db.add_participant(participant)
            .map_err(|e| DiagramError::structural(e.to_string(), line_number))?;
        self.join_active_group(db, id, line_number)
    }

    fn position_override(
        &mut self,
        db: &mut SequenceDatabase,
        captures: &Captures<'_>,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        let id = captures[1].trim();
        let position = Some(parse_position(&captures[2]));

        let participant = match db.participant(id) {
            Some(existing) => existing.clone().with_position(position),
            None => Participant::new(id, infer_participant_type(id), line_number)
                .with_position(position),
        };
        trace!(line_number, participant = id, ?position, "Position override");
        db.add_participant(participant)
            .map_err(|e| DiagramError::structural(e.to_string(), line_number))?;
        self.join_active_group(db, id, line_number)
    }

    fn join_active_group(
        &mut self,
        db: &mut SequenceDatabase,
        id: &str,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        let Some(group_index) = self.active_group else {
            return Ok(());
        };

        match self.group_membership.get(id) {
            Some(&existing) if existing == group_index => Ok(()),
            Some(&existing) => {
                let group = db
                    .groups()
                    .get(existing)
                    .map(|g| g.name.clone())
                    .unwrap_or_default();
                Err(DiagramError::structural(
                    format!("Participant '{}' is already in group '{}'", id, group),
                    line_number,
                ))
            }
            None => {
                self.group_membership.insert(id.to_string(), group_index);
                if let Some(group) = db.group_mut(group_index) {
                    group.participant_ids.push(id.to_string());
                }
                Ok(())
            }
        }
    }

    fn content(
        &mut self,
        db: &mut SequenceDatabase,
        line: &str,
        indent: usize,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        let p = patterns();
        let else_if = p.else_if.captures(line);
        let is_else = else_if.is_some() || p.else_only.is_match(line);
        self.close_blocks(db, indent, is_else);

        if has_arrow(line)
            && line
                .split_whitespace()
                .next()
                .is_some_and(|word| word.eq_ignore_ascii_case("async"))
        {
            return Err(DiagramError::structural(
                "The 'async' keyword is not supported; use '~>' for async messages",
                line_number,
            ));
        }

        if let Some(statement) = parse_message_statement(line) {
            return self.message(db, statement, line_number);
        }

        if let Some(captures) = p.block_open.captures(line) {
            let kind = match captures[1].to_lowercase().as_str() {
                "if" => BlockKind::If,
                "loop" => BlockKind::Loop,
                _ => BlockKind::Parallel,
            };
            let label = trimmed_group(&captures, 2).unwrap_or_default();
            trace!(line_number, kind = kind.keyword(), label, "Block opened");
            self.content_started = true;
            self.stack.push(OpenBlock {
                block: Block::new(kind, label, line_number),
                indent,
                branch: Branch::Children,
            });
            return Ok(());
        }

        if let Some(captures) = else_if {
            let label = trimmed_group(&captures, 1).unwrap_or_default();
            return self.else_branch(Some(label), indent, line_number);
        }
        if is_else {
            return self.else_branch(None, indent, line_number);
        }

        if let Some(captures) = p.note.captures(line) {
            self.note(db, &captures, indent, line_number);
            return Ok(());
        }

        if has_arrow(line) {
            debug!(line_number, line, "Ignoring arrow line that is not a message");
        } else {
            trace!(line_number, line, "Ignoring unrecognised line");
        }
        Ok(())
    }

    fn message(
        &mut self,
        db: &mut SequenceDatabase,
        statement: MessageStatement<'_>,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        self.content_started = true;

        for id in [statement.from, statement.to] {
            db.ensure_participant(id, infer_participant_type(id), line_number)
                .map_err(|e| DiagramError::structural(e.to_string(), line_number))?;
        }

        let (label, return_label) = if statement.is_async {
            (statement.label.to_string(), None)
        } else {
            split_return_label(statement.label)
        };

        let message = Message::new(statement.from, statement.to, label)
            .with_return_label(return_label)
            .with_async(statement.is_async)
            .at_line(line_number);
        let index = db
            .add_message(message)
            .map_err(|e| DiagramError::structural(e.to_string(), line_number))?;
        trace!(
            line_number,
            index,
            from = statement.from,
            to = statement.to,
            is_async = statement.is_async,
            "Message"
        );

        let stored = db.messages()[index].clone();
        self.append(db, SequenceElement::Message(stored));
        self.last_sender = Some(statement.from.to_string());
        Ok(())
    }

    fn else_branch(
        &mut self,
        label: Option<&str>,
        indent: usize,
        line_number: usize,
    ) -> Result<(), DiagramError> {
        self.content_started = true;
        let keyword = if label.is_some() { "else if" } else { "else" };

        let Some(open) = self.stack.last_mut().filter(|open| open.indent == indent) else {
            debug!(line_number, keyword, "Ignoring branch with no open block at this indent");
            return Ok(());
        };

        match open.block.kind {
            BlockKind::Parallel => Err(DiagramError::structural(
                format!("'{}' is not supported in 'parallel' blocks", keyword),
                line_number,
            )),
            BlockKind::Loop => {
                debug!(line_number, keyword, "Ignoring branch inside 'loop' block");
                Ok(())
            }
            BlockKind::If => {
                match (label, open.branch) {
                    (_, Branch::Else) => {
                        debug!(line_number, keyword, "Ignoring branch after 'else'");
                    }
                    (Some(label), _) => {
                        open.block.else_if_branches.push(ElseIfBranch {
                            label: label.to_string(),
                            children: Vec::new(),
                            line_number,
                        });
                        open.branch = Branch::ElseIf;
                    }
                    (None, _) => open.branch = Branch::Else,
                }
                Ok(())
            }
        }
    }

    fn note(
        &mut self,
        db: &mut SequenceDatabase,
        captures: &Captures<'_>,
        indent: usize,
        line_number: usize,
    ) {
        self.content_started = true;

        let position = match captures.get(1).map(|m| m.as_str().to_lowercase()) {
            Some(side) if side == "left" => NotePosition::Left,
            _ => NotePosition::Right,
        };
        let participant = trimmed_group(captures, 2)
            .map(str::to_string)
            .or_else(|| self.last_sender.clone());
        let after_message = db.message_count().checked_sub(1);

        match captures.get(3) {
            Some(text) => {
                let text = text.as_str().trim().to_string();
                self.push_note(db, participant, position, text, line_number, after_message);
            }
            None => {
                self.pending_note = Some(PendingNote {
                    participant,
                    position,
                    indent,
                    line_number,
                    after_message,
                    lines: Vec::new(),
                });
            }
        }
    }

    /// Feed a line to the pending multi-line note; returns true if consumed
    fn collect_note_body(&mut self, db: &mut SequenceDatabase, raw: &str) -> bool {
        let Some(note) = self.pending_note.as_mut() else {
            return false;
        };

        let text = raw.trim();
        if text.is_empty() {
            note.lines.push(String::new());
            return true;
        }
        if measure_indent(raw) > note.indent {
            note.lines.push(text.to_string());
            return true;
        }

        self.finish_note(db);
        false
    }

    fn finish_note(&mut self, db: &mut SequenceDatabase) {
        let Some(note) = self.pending_note.take() else {
            return;
        };

        let first = note.lines.iter().position(|l| !l.is_empty());
        let last = note.lines.iter().rposition(|l| !l.is_empty());
        let text = match (first, last) {
            (Some(first), Some(last)) => note.lines[first..=last].join("\n"),
            _ => String::new(),
        };

        self.push_note(
            db,
            note.participant,
            note.position,
            text,
            note.line_number,
            note.after_message,
        );
    }

    fn push_note(
        &mut self,
        db: &mut SequenceDatabase,
        participant: Option<String>,
        position: NotePosition,
        text: String,
        line_number: usize,
        after_message: Option<usize>,
    ) {
        if text.is_empty() {
            debug!(line_number, "Skipping note without text");
            return;
        }
        let Some(participant_id) = participant.filter(|id| db.has_participant(id)) else {
            debug!(line_number, "Skipping note for unknown participant");
            return;
        };

        trace!(line_number, participant = %participant_id, "Note");
        self.append(
            db,
            SequenceElement::Note(Note {
                text,
                position,
                participant_id,
                line_number,
                after_message,
            }),
        );
    }

    /// Close every open block whose indent is at least `indent`
    ///
    /// With `keep_for_else`, an `if` or `parallel` block at exactly `indent`
    /// stays open so the branch line can attach to it.
    fn close_blocks(&mut self, db: &mut SequenceDatabase, indent: usize, keep_for_else: bool) {
        while let Some(open) = self.stack.last() {
            if open.indent < indent {
                break;
            }
            if keep_for_else && open.indent == indent && open.block.kind != BlockKind::Loop {
                break;
            }
            self.pop_block(db);
        }
    }

    fn pop_block(&mut self, db: &mut SequenceDatabase) {
        if let Some(open) = self.stack.pop() {
            trace!(line_number = open.block.line_number, "Block closed");
            self.append(db, SequenceElement::Block(open.block));
        }
    }

    fn append(&mut self, db: &mut SequenceDatabase, element: SequenceElement) {
        match self.stack.last_mut() {
            Some(open) => open.container().push(element),
            None => db.push_element(element),
        }
    }

    fn finish(&mut self, db: &mut SequenceDatabase) {
        self.finish_note(db);
        while !self.stack.is_empty() {
            self.pop_block(db);
        }
    }
}

fn parse_document(input: &str, db: &mut SequenceDatabase) -> Result<(), DiagramError> {
    let mut context = ParseContext::default();
    for (index, raw) in input.lines().enumerate() {
        context.parse_line(db, raw, index + 1)?;
    }
    context.finish(db);

    if !context.saw_chart_header && db.message_count() == 0 && !has_arrow_like(input) {
        return Err(DiagramError::content(
            "No sequence content detected: add 'chart: sequence' or a message like 'A -> B: hello'",
        ));
    }
    Ok(())
}

/// Sequence diagram parser
pub struct SequenceParser;

impl SequenceParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequenceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<SequenceDatabase> for SequenceParser {
    fn parse(&self, input: &str, database: &mut SequenceDatabase) -> Result<()> {
        let parse_span = span!(Level::INFO, "parse_sequence", input_len = input.len());
        let _enter = parse_span.enter();

        match parse_document(input, database) {
            Ok(()) => {
                debug!(
                    participant_count = database.participant_count(),
                    message_count = database.message_count(),
                    group_count = database.groups().len(),
                    section_count = database.sections().len(),
                    "Parsed document"
                );
                info!("Sequence parse completed");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Sequence parse failed");
                database.set_error(err.clone());
                Err(err.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "sequence"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        SequenceDetector::new().confidence(input) > 0.0
    }
}
