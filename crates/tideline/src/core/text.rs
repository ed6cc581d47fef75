//! Shared text utilities for diagram processing
//!
//! Text metrics are approximate: widths are display columns multiplied by a
//! fixed average character width. Notes additionally support a small inline
//! markup subset (bold, italic, code and links).

use std::borrow::Cow;
use std::sync::OnceLock;

use pulldown_cmark::{Event, Parser as MarkdownParser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

/// Display width of a string in columns
pub fn text_columns(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Approximate rendered width of a string
pub fn estimate_width(text: &str, avg_char_width: f64) -> f64 {
    text_columns(text) as f64 * avg_char_width
}

/// Style of an inline text span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "style", rename_all = "camelCase")]
pub enum SpanStyle {
    Plain,
    Bold,
    Italic,
    Code,
    Link { url: String },
}

/// A run of text sharing one inline style
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineSpan {
    pub text: String,
    #[serde(flatten)]
    pub style: SpanStyle,
}

impl InlineSpan {
    fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Tokenize a single line into inline spans.
///
/// Inline Markdown is read with CommonMark rules: `**bold**`, `*italic*` /
/// `_italic_`, `` `code` `` and `[text](url)`. Unmatched or intraword
/// markers (`snake_case`, `2 * 3`) stay plain text, and line-start syntax
/// such as `# ` or `- ` is kept literally rather than read as a block.
///
/// # Example
/// ```
/// use tideline::core::{parse_inline_spans, SpanStyle};
///
/// let spans = parse_inline_spans("call **now**");
/// assert_eq!(spans[1].text, "now");
/// assert_eq!(spans[1].style, SpanStyle::Bold);
/// ```
pub fn parse_inline_spans(line: &str) -> Vec<InlineSpan> {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];

    let mut spans = Vec::new();
    push_span(&mut spans, indent, &SpanStyle::Plain);

    let shielded = shield_block_syntax(body);
    let mut styles: Vec<SpanStyle> = Vec::new();
    for event in MarkdownParser::new(&shielded) {
        let current = styles.last().cloned().unwrap_or(SpanStyle::Plain);
        match event {
            Event::Start(Tag::Strong) => styles.push(SpanStyle::Bold),
            Event::Start(Tag::Emphasis) => styles.push(SpanStyle::Italic),
            Event::Start(Tag::Link { dest_url, .. }) => styles.push(SpanStyle::Link {
                url: dest_url.to_string(),
            }),
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link) => {
                styles.pop();
            }
            Event::Text(text) | Event::InlineHtml(text) | Event::Html(text) => {
                push_span(&mut spans, &text, &current)
            }
            Event::Code(text) => push_span(&mut spans, &text, &SpanStyle::Code),
            Event::SoftBreak | Event::HardBreak => push_span(&mut spans, " ", &current),
            _ => {}
        }
    }

    if spans.is_empty() {
        spans.push(InlineSpan::new("", SpanStyle::Plain));
    }
    spans
}

/// Escape the first character of a line that would otherwise open a
/// Markdown block (heading, quote, list, rule, fence, HTML block or link
/// reference definition), so the whole line is read as paragraph text.
fn shield_block_syntax(line: &str) -> Cow<'_, str> {
    static LINK_DEFINITION: OnceLock<Regex> = OnceLock::new();
    let link_definition = LINK_DEFINITION
        .get_or_init(|| Regex::new(r"^\[[^\]]*\]:").expect("link definition pattern is valid"));

    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return Cow::Borrowed(line);
    };
    let second = chars.next();
    let marker_then_space = second.map_or(true, char::is_whitespace);

    let escape_first = match first {
        '#' | '>' | '<' => true,
        '-' | '+' | '*' if marker_then_space => true,
        '-' | '*' | '_' => is_thematic_break(line, first),
        '`' | '~' => line.starts_with("```") || line.starts_with("~~~"),
        '[' => link_definition.is_match(line),
        _ => false,
    };
    if escape_first {
        return Cow::Owned(format!("\\{line}"));
    }

    // Ordered list marker: up to nine digits, then `.` or `)` and a space
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if (1..=9).contains(&digits) {
        let rest = &line[digits..];
        let mut rest_chars = rest.chars();
        if matches!(rest_chars.next(), Some('.' | ')'))
            && rest_chars.next().map_or(true, char::is_whitespace)
        {
            return Cow::Owned(format!("{}\\{}", &line[..digits], rest));
        }
    }
    Cow::Borrowed(line)
}

/// Three or more of the same marker, optionally spaced: `---`, `* * *`
fn is_thematic_break(line: &str, marker: char) -> bool {
    line.chars().all(|c| c == marker || c == ' ' || c == '\t')
        && line.chars().filter(|&c| c == marker).count() >= 3
}

/// Append text to a span list, extending the last span when styles match
fn push_span(spans: &mut Vec<InlineSpan>, text: &str, style: &SpanStyle) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if &last.style == style => last.text.push_str(text),
        _ => spans.push(InlineSpan::new(text, style.clone())),
    }
}

/// A whitespace-delimited word that may cross style boundaries
struct StyledWord {
    /// Style of the whitespace in front of the word
    gap: SpanStyle,
    pieces: Vec<InlineSpan>,
}

fn pieces_width(pieces: &[InlineSpan]) -> usize {
    pieces.iter().map(|piece| text_columns(&piece.text)).sum()
}

fn styled_words(spans: &[InlineSpan]) -> Vec<StyledWord> {
    let mut words = Vec::new();
    let mut current: Option<StyledWord> = None;
    let mut gap = SpanStyle::Plain;

    for span in spans {
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                words.extend(current.take());
                gap = span.style.clone();
                continue;
            }
            let word = current.get_or_insert_with(|| StyledWord {
                gap: gap.clone(),
                pieces: Vec::new(),
            });
            push_span(&mut word.pieces, ch.encode_utf8(&mut [0; 4]), &span.style);
        }
    }
    words.extend(current);
    words
}

/// Split a styled word into chunks of at most `max_width` columns
fn split_long_styled_word(pieces: Vec<InlineSpan>, max_width: usize) -> Vec<Vec<InlineSpan>> {
    if pieces_width(&pieces) <= max_width {
        return vec![pieces];
    }

    let mut chunks = Vec::new();
    let mut chunk = Vec::new();
    let mut width = 0;
    for piece in &pieces {
        for ch in piece.text.chars() {
            let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if width + ch_width > max_width && !chunk.is_empty() {
                chunks.push(std::mem::take(&mut chunk));
                width = 0;
            }
            push_span(&mut chunk, ch.encode_utf8(&mut [0; 4]), &piece.style);
            width += ch_width;
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

/// Wrap styled text to fit within a maximum width, breaking on word boundaries.
///
/// Each returned line fits within `max_width` display columns; words longer
/// than that are split across lines. If `max_width` is 0, or the text fits,
/// the spans come back unchanged as a single line. Widths count visible text
/// only, so markup never takes up room, and a styled phrase that crosses a
/// break keeps its style on both lines.
///
/// # Example
/// ```
/// use tideline::core::{parse_inline_spans, wrap_spans, SpanStyle};
///
/// let lines = wrap_spans(&parse_inline_spans("**bold words here**"), 10);
/// assert_eq!(lines.len(), 2);
/// assert!(lines.iter().flatten().all(|span| span.style == SpanStyle::Bold));
/// ```
pub fn wrap_spans(spans: &[InlineSpan], max_width: usize) -> Vec<Vec<InlineSpan>> {
    if max_width == 0 || text_columns(&spans_text(spans)) <= max_width {
        return vec![spans.to_vec()];
    }

    let mut lines = Vec::new();
    let mut line: Vec<InlineSpan> = Vec::new();
    let mut width = 0;

    for word in styled_words(spans) {
        for piece in split_long_styled_word(word.pieces, max_width) {
            let piece_width = pieces_width(&piece);
            if line.is_empty() {
                line = piece;
                width = piece_width;
            } else if width + 1 + piece_width <= max_width {
                push_span(&mut line, " ", &word.gap);
                for span in &piece {
                    push_span(&mut line, &span.text, &span.style);
                }
                width += 1 + piece_width;
            } else {
                lines.push(std::mem::take(&mut line));
                line = piece;
                width = piece_width;
            }
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(vec![InlineSpan::new("", SpanStyle::Plain)]);
    }
    lines
}

/// Concatenated text of a span list, without markup
pub fn spans_text(spans: &[InlineSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}
